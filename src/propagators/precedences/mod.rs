//! Incremental precedence reasoning: the conditional-arc propagator, the level-zero relation
//! store and the clause-driven synthesis of `GreaterThanAtLeastOneOf` constraints.
mod at_least_one_of;
mod propagator;
mod relation_store;

#[cfg(test)]
mod test_helper;
#[cfg(test)]
mod tests;

pub use at_least_one_of::GreaterThanAtLeastOneOf;
pub use at_least_one_of::PresenceProber;
pub use at_least_one_of::ProbeOutcome;
pub use propagator::ArcIndex;
pub use propagator::IntegerPrecedence;
pub use propagator::PrecedencesPropagator;
pub use relation_store::FullPrecedence;
pub use relation_store::PrecedenceRelations;
