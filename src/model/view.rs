use crate::branching::BranchingDecision;
use crate::engine::variables::IntegerLiteral;
use crate::engine::BooleanTrail;
use crate::engine::IntegerTrail;
use crate::metronome_asserts::metronome_assert_moderate;
use crate::metronome_asserts::metronome_assert_simple;
use crate::model::IntegerEncoder;
use crate::model::MappedVariable;
use crate::model::ModelMapping;

/// A unified read view over the model variables: Boolean and integer variables answer the same
/// fixedness/bounds queries, and decisions on them are produced as [`BranchingDecision`]s.
#[derive(Debug)]
pub struct ModelView<'a> {
    mapping: &'a ModelMapping,
    encoder: &'a IntegerEncoder,
    boolean_trail: &'a BooleanTrail,
    integer_trail: &'a IntegerTrail,
}

impl<'a> ModelView<'a> {
    pub fn new(
        mapping: &'a ModelMapping,
        encoder: &'a IntegerEncoder,
        boolean_trail: &'a BooleanTrail,
        integer_trail: &'a IntegerTrail,
    ) -> Self {
        ModelView {
            mapping,
            encoder,
            boolean_trail,
            integer_trail,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.mapping.num_model_variables()
    }

    pub fn is_fixed(&self, model_variable: usize) -> bool {
        match self.mapping.mapped(model_variable) {
            MappedVariable::Boolean(literal) => self
                .boolean_trail
                .is_variable_assigned(literal.get_propositional_variable()),
            MappedVariable::Integer(var) => self.integer_trail.is_fixed(var),
            MappedVariable::Unused => true,
        }
    }

    /// Whether the variable is optional and currently ignored; such variables are skipped by
    /// the branching strategies.
    pub fn is_currently_free(&self, model_variable: usize) -> bool {
        match self.mapping.mapped(model_variable) {
            MappedVariable::Integer(var) => self
                .integer_trail
                .is_currently_ignored(var, self.boolean_trail),
            _ => false,
        }
    }

    pub fn min(&self, model_variable: usize) -> i64 {
        match self.mapping.mapped(model_variable) {
            MappedVariable::Boolean(literal) => {
                if self.boolean_trail.is_literal_assigned_true(literal) {
                    1
                } else {
                    0
                }
            }
            MappedVariable::Integer(var) => self.integer_trail.lower_bound(var),
            MappedVariable::Unused => 0,
        }
    }

    pub fn max(&self, model_variable: usize) -> i64 {
        match self.mapping.mapped(model_variable) {
            MappedVariable::Boolean(literal) => {
                if self.boolean_trail.is_literal_assigned_false(literal) {
                    0
                } else {
                    1
                }
            }
            MappedVariable::Integer(var) => self.integer_trail.upper_bound(var),
            MappedVariable::Unused => 0,
        }
    }

    /// The decision `variable >= value`, or [`None`] when the value is outside the Boolean
    /// range.
    pub fn greater_or_equal(&self, model_variable: usize, value: i64) -> Option<BranchingDecision> {
        metronome_assert_moderate!(!self.is_fixed(model_variable));
        match self.mapping.mapped(model_variable) {
            MappedVariable::Boolean(literal) => {
                metronome_assert_moderate!(value == 0 || value == 1);
                (value == 1).then_some(BranchingDecision::Boolean(literal))
            }
            MappedVariable::Integer(var) => Some(BranchingDecision::Integer(
                IntegerLiteral::greater_or_equal(var, value),
            )),
            MappedVariable::Unused => None,
        }
    }

    /// The decision `variable <= value`, or [`None`] when the value is outside the Boolean
    /// range.
    pub fn lower_or_equal(&self, model_variable: usize, value: i64) -> Option<BranchingDecision> {
        metronome_assert_moderate!(!self.is_fixed(model_variable));
        match self.mapping.mapped(model_variable) {
            MappedVariable::Boolean(literal) => {
                metronome_assert_moderate!(value == 0 || value == 1);
                (value == 0).then_some(BranchingDecision::Boolean(!literal))
            }
            MappedVariable::Integer(var) => Some(BranchingDecision::Integer(
                IntegerLiteral::lower_or_equal(var, value),
            )),
            MappedVariable::Unused => None,
        }
    }

    /// The decision fixing the variable to the median of its unassigned encoding values; the
    /// lower median is taken on ties. Boolean variables are biased towards 0.
    pub fn median_value(&self, model_variable: usize) -> Option<BranchingDecision> {
        metronome_assert_moderate!(!self.is_fixed(model_variable));
        match self.mapping.mapped(model_variable) {
            MappedVariable::Boolean(literal) => Some(BranchingDecision::Boolean(!literal)),
            MappedVariable::Integer(var) => {
                metronome_assert_simple!(
                    self.encoder.is_fully_encoded(var),
                    "median decisions require a fully encoded variable"
                );
                let unassigned = self
                    .encoder
                    .raw_domain_encoding(var)
                    .iter()
                    .filter(|pair| !self.boolean_trail.is_literal_assigned(pair.literal))
                    .map(|pair| pair.literal)
                    .collect::<Vec<_>>();
                if unassigned.is_empty() {
                    return None;
                }
                // 5 unassigned values -> the third, 4 values -> the second.
                let target = (unassigned.len() + 1) / 2 - 1;
                Some(BranchingDecision::Boolean(unassigned[target]))
            }
            MappedVariable::Unused => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::variables::IntegerVariable;
    use crate::engine::variables::Literal;

    struct Setup {
        mapping: ModelMapping,
        encoder: IntegerEncoder,
        boolean_trail: BooleanTrail,
        integer_trail: IntegerTrail,
        literal: Literal,
        var: IntegerVariable,
    }

    fn setup() -> Setup {
        let mut boolean_trail = BooleanTrail::default();
        let mut integer_trail = IntegerTrail::default();
        let literal = boolean_trail.new_literal();
        let var = integer_trail.grow(0, 9);
        let mapping = ModelMapping::new(vec![
            MappedVariable::Boolean(literal),
            MappedVariable::Integer(var),
        ]);
        Setup {
            mapping,
            encoder: IntegerEncoder::default(),
            boolean_trail,
            integer_trail,
            literal,
            var,
        }
    }

    #[test]
    fn booleans_and_integers_answer_the_same_queries() {
        let setup = setup();
        let view = ModelView::new(
            &setup.mapping,
            &setup.encoder,
            &setup.boolean_trail,
            &setup.integer_trail,
        );

        assert!(!view.is_fixed(0));
        assert!(!view.is_fixed(1));
        assert_eq!((0, 1), (view.min(0), view.max(0)));
        assert_eq!((0, 9), (view.min(1), view.max(1)));

        // An out-of-range Boolean request yields no decision.
        assert_eq!(None, view.greater_or_equal(0, 0));
        assert_eq!(
            Some(BranchingDecision::Boolean(setup.literal)),
            view.greater_or_equal(0, 1)
        );
        assert_eq!(
            Some(BranchingDecision::Boolean(!setup.literal)),
            view.lower_or_equal(0, 0)
        );
        assert_eq!(
            Some(BranchingDecision::Integer(IntegerLiteral::lower_or_equal(
                setup.var, 4
            ))),
            view.lower_or_equal(1, 4)
        );
    }

    #[test]
    fn the_median_decision_takes_the_lower_median_of_unassigned_values() {
        let mut setup = setup();
        let _ = setup.encoder.full_encode(
            &mut setup.boolean_trail,
            setup.var,
            &[9, 1, 5, 7, 2],
        );
        let view = ModelView::new(
            &setup.mapping,
            &setup.encoder,
            &setup.boolean_trail,
            &setup.integer_trail,
        );

        let median = view.median_value(1).expect("a median literal exists");
        let expected = setup
            .encoder
            .raw_domain_encoding(setup.var)
            .iter()
            .find(|pair| pair.value == 5)
            .map(|pair| pair.literal)
            .expect("value 5 is encoded");
        assert_eq!(BranchingDecision::Boolean(expected), median);
    }

    #[test]
    fn assigned_encoding_literals_shift_the_median() {
        let mut setup = setup();
        let encoding = setup
            .encoder
            .full_encode(&mut setup.boolean_trail, setup.var, &[1, 2, 5, 7, 9])
            .to_vec();

        // Ruling out 1 and 2 leaves {5, 7, 9}, whose median is 7.
        setup.boolean_trail.enqueue_decision(!encoding[0].literal);
        setup.boolean_trail.enqueue_decision(!encoding[1].literal);
        let view = ModelView::new(
            &setup.mapping,
            &setup.encoder,
            &setup.boolean_trail,
            &setup.integer_trail,
        );

        let median = view.median_value(1).expect("a median literal exists");
        assert_eq!(BranchingDecision::Boolean(encoding[3].literal), median);
    }

    #[test]
    fn boolean_medians_are_biased_towards_zero() {
        let setup = setup();
        let view = ModelView::new(
            &setup.mapping,
            &setup.encoder,
            &setup.boolean_trail,
            &setup.integer_trail,
        );

        assert_eq!(
            Some(BranchingDecision::Boolean(!setup.literal)),
            view.median_value(0)
        );
    }
}
