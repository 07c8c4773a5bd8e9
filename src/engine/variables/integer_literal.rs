use super::IntegerVariable;

/// The atomic fact `var >= bound` over an [`IntegerVariable`] view.
///
/// Upper-bound facts are expressed through negation: `var <= bound` is stored as
/// `negation(var) >= -bound`. Conflict and propagation reasons are conjunctions of these.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerLiteral {
    pub var: IntegerVariable,
    pub bound: i64,
}

impl IntegerLiteral {
    pub fn greater_or_equal(var: IntegerVariable, bound: i64) -> IntegerLiteral {
        IntegerLiteral { var, bound }
    }

    pub fn lower_or_equal(var: IntegerVariable, bound: i64) -> IntegerLiteral {
        IntegerLiteral {
            var: var.negation(),
            bound: -bound,
        }
    }
}

impl std::fmt::Display for IntegerLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} >= {}]", self.var, self.bound)
    }
}

impl std::fmt::Debug for IntegerLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
