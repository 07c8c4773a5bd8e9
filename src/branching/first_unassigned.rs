use crate::branching::Brancher;
use crate::branching::BranchingDecision;
use crate::branching::SelectionContext;
use crate::engine::variables::IntegerLiteral;
use crate::engine::variables::IntegerVariable;

/// A [`Brancher`] which fixes the first unassigned variable of its list to its current lower
/// bound; the usual tail of a fixed search which instantiates everything the earlier
/// heuristics left open.
#[derive(Debug)]
pub struct FirstUnassignedVarAtItsMin {
    decisions: Vec<IntegerVariable>,
}

impl FirstUnassignedVarAtItsMin {
    pub fn new(decisions: Vec<IntegerVariable>) -> Self {
        FirstUnassignedVarAtItsMin { decisions }
    }
}

impl Brancher for FirstUnassignedVarAtItsMin {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<BranchingDecision> {
        self.decisions
            .iter()
            .find(|&&var| !context.is_integer_fixed(var) && !context.is_currently_ignored(var))
            .map(|&var| {
                BranchingDecision::Integer(IntegerLiteral::lower_or_equal(
                    var,
                    context.integer_trail().lower_bound(var),
                ))
            })
    }
}
