use crate::basic_types::Random;
use crate::engine::variables::IntegerVariable;
use crate::engine::BooleanTrail;
use crate::engine::IntegerTrail;
use crate::model::IntegerEncoder;
use crate::model::ModelMapping;
use crate::model::ModelView;
use crate::parameters::SatParameters;

/// The context provided to a [`Brancher`](crate::branching::Brancher): read access to the
/// solver state through the model view, the search parameters, and the random generator used
/// by randomized strategies.
#[derive(Debug)]
pub struct SelectionContext<'a> {
    mapping: &'a ModelMapping,
    encoder: &'a IntegerEncoder,
    boolean_trail: &'a BooleanTrail,
    integer_trail: &'a IntegerTrail,
    parameters: &'a SatParameters,
    random: &'a mut dyn Random,
}

impl<'a> SelectionContext<'a> {
    pub fn new(
        mapping: &'a ModelMapping,
        encoder: &'a IntegerEncoder,
        boolean_trail: &'a BooleanTrail,
        integer_trail: &'a IntegerTrail,
        parameters: &'a SatParameters,
        random: &'a mut dyn Random,
    ) -> Self {
        SelectionContext {
            mapping,
            encoder,
            boolean_trail,
            integer_trail,
            parameters,
            random,
        }
    }

    /// The unified view over the model variables.
    pub fn view(&self) -> ModelView<'_> {
        ModelView::new(
            self.mapping,
            self.encoder,
            self.boolean_trail,
            self.integer_trail,
        )
    }

    pub fn parameters(&self) -> &SatParameters {
        self.parameters
    }

    pub fn random(&mut self) -> &mut dyn Random {
        self.random
    }

    pub fn boolean_trail(&self) -> &BooleanTrail {
        self.boolean_trail
    }

    pub fn integer_trail(&self) -> &IntegerTrail {
        self.integer_trail
    }

    pub fn encoder(&self) -> &IntegerEncoder {
        self.encoder
    }

    pub fn is_integer_fixed(&self, var: IntegerVariable) -> bool {
        self.integer_trail.is_fixed(var)
    }

    pub fn is_currently_ignored(&self, var: IntegerVariable) -> bool {
        self.integer_trail
            .is_currently_ignored(var, self.boolean_trail)
    }
}
