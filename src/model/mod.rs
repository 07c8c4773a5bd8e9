//! A thin description of a CP model and the adapters which bridge it to the solver state: the
//! variable mapping, the full domain encodings and the [`ModelView`] used by the branching
//! layer.
mod cp_model;
mod encoder;
mod mapping;
mod view;

pub use cp_model::negated_ref;
pub use cp_model::positive_ref;
pub use cp_model::ref_is_positive;
pub use cp_model::AffineTransformation;
pub use cp_model::Constraint;
pub use cp_model::CpModel;
pub use cp_model::DecisionStrategy;
pub use cp_model::DomainReductionStrategy;
pub use cp_model::Objective;
pub use cp_model::VariableDescription;
pub use cp_model::VariableSelectionStrategy;
pub use encoder::IntegerEncoder;
pub use encoder::ValueLiteralPair;
pub use mapping::MappedVariable;
pub use mapping::ModelMapping;
pub use view::ModelView;
