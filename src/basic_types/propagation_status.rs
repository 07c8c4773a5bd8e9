use crate::engine::variables::IntegerLiteral;
use crate::engine::variables::Literal;
use crate::engine::EmptyDomain;

/// The result of invoking a constraint programming propagator. The propagation can either
/// succeed or identify a conflict. The necessary conditions for the conflict must be captured
/// in the error variant.
pub type PropagationStatusCP = Result<(), Inconsistency>;

/// The reason for a propagation or a conflict: a conjunction of Boolean literals and integer
/// bound literals which all hold in the current state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reason {
    pub literals: Vec<Literal>,
    pub integer_literals: Vec<IntegerLiteral>,
}

impl Reason {
    pub fn new(literals: Vec<Literal>, integer_literals: Vec<IntegerLiteral>) -> Self {
        Reason {
            literals,
            integer_literals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.integer_literals.is_empty()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Inconsistency {
    EmptyDomain,
    Conflict(Reason),
}

impl From<EmptyDomain> for Inconsistency {
    fn from(_: EmptyDomain) -> Self {
        Inconsistency::EmptyDomain
    }
}

impl From<Reason> for Inconsistency {
    fn from(value: Reason) -> Self {
        Inconsistency::Conflict(value)
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .literals
            .iter()
            .map(|literal| literal.to_string())
            .chain(
                self.integer_literals
                    .iter()
                    .map(|integer_literal| integer_literal.to_string()),
            )
            .collect::<Vec<_>>();
        if rendered.is_empty() {
            write!(f, "{{empty}}")
        } else {
            write!(f, "{}", rendered.join("; "))
        }
    }
}
