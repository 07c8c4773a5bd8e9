use crate::basic_types::HashMap;
use crate::engine::variables::IntegerVariable;
use crate::engine::variables::Literal;
use crate::engine::BooleanTrail;

/// A value of a variable domain together with the literal standing for `var == value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueLiteralPair {
    pub value: i64,
    pub literal: Literal,
}

/// The registry of full domain encodings: for a fully encoded variable, one literal per domain
/// value, kept sorted by value.
///
/// Only the encodings themselves are managed here; the exactly-one semantics between the
/// literals is the business of the SAT core.
#[derive(Debug, Default)]
pub struct IntegerEncoder {
    encodings: HashMap<IntegerVariable, Vec<ValueLiteralPair>>,
}

impl IntegerEncoder {
    /// Fully encodes `var` over the given domain values with fresh literals; returns the
    /// encoding sorted by value.
    pub fn full_encode(
        &mut self,
        boolean_trail: &mut BooleanTrail,
        var: IntegerVariable,
        values: &[i64],
    ) -> &[ValueLiteralPair] {
        let mut encoding = values
            .iter()
            .map(|&value| ValueLiteralPair {
                value,
                literal: boolean_trail.new_literal(),
            })
            .collect::<Vec<_>>();
        encoding.sort_by_key(|pair| pair.value);
        self.encodings.entry(var).or_insert(encoding).as_slice()
    }

    pub fn is_fully_encoded(&self, var: IntegerVariable) -> bool {
        self.encodings.contains_key(&var)
    }

    /// The encoding of a fully encoded variable, sorted by value.
    pub fn raw_domain_encoding(&self, var: IntegerVariable) -> &[ValueLiteralPair] {
        self.encodings
            .get(&var)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The `(variable, value)` pair a literal encodes, if it is part of an encoding.
    ///
    /// Encoding literals are minted fresh per value in [`IntegerEncoder::full_encode`], so a
    /// literal is associated with at most one pair; should encodings ever start sharing
    /// literals, this lookup (and the decision logging built on it) has to become
    /// multi-valued.
    pub fn decode_literal(&self, literal: Literal) -> Option<(IntegerVariable, i64)> {
        self.encodings.iter().find_map(|(&var, encoding)| {
            encoding
                .iter()
                .find(|pair| pair.literal == literal)
                .map(|pair| (var, pair.value))
        })
    }
}
