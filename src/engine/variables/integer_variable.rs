use crate::basic_types::StorageKey;

/// A handle to an integer variable together with a sign.
///
/// Each variable created through [`IntegerTrail::grow`](crate::engine::IntegerTrail::grow)
/// materialises two handles: the positive view with an even code, and its negation with the
/// following odd code. The negation of `v` represents `-v`, so that
/// `lower(negation(v)) = -upper(v)`; this makes it possible to store precedence arcs
/// symmetrically on both orientations and to express upper-bound reasoning purely in terms of
/// lower bounds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntegerVariable {
    code: u32,
}

impl IntegerVariable {
    pub fn from_index(index: usize) -> IntegerVariable {
        IntegerVariable { code: index as u32 }
    }

    pub fn index(&self) -> usize {
        self.code as usize
    }

    /// The view representing the negation of this variable; an involution.
    pub fn negation(&self) -> IntegerVariable {
        IntegerVariable {
            code: self.code ^ 1,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.code & 1 == 0
    }

    /// The positive view of the underlying variable, regardless of the sign of this handle.
    pub fn positive_variable(&self) -> IntegerVariable {
        IntegerVariable {
            code: self.code & !1,
        }
    }
}

impl StorageKey for IntegerVariable {
    fn index(&self) -> usize {
        self.code as usize
    }

    fn create_from_index(index: usize) -> Self {
        IntegerVariable::from_index(index)
    }
}

impl std::fmt::Display for IntegerVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_positive() {
            write!(f, "x{}", self.code / 2)
        } else {
            write!(f, "~x{}", self.code / 2)
        }
    }
}

impl std::fmt::Debug for IntegerVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
