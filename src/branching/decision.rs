use thiserror::Error;

use crate::engine::variables::IntegerLiteral;
use crate::engine::variables::Literal;

/// A branching decision over either side of the model: a Boolean literal to assign or an
/// integer bound to enforce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchingDecision {
    Boolean(Literal),
    Integer(IntegerLiteral),
}

#[derive(Debug, Error, Copy, Clone)]
#[error("Attempt to use a Boolean decision as an integer bound")]
pub struct BooleanDecisionConversionError;

impl TryFrom<BranchingDecision> for IntegerLiteral {
    type Error = BooleanDecisionConversionError;

    fn try_from(value: BranchingDecision) -> Result<Self, Self::Error> {
        match value {
            BranchingDecision::Integer(integer_literal) => Ok(integer_literal),
            BranchingDecision::Boolean(_) => Err(BooleanDecisionConversionError),
        }
    }
}
