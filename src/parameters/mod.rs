//! Solver parameters and the enumeration of a diverse portfolio of parameter variants for
//! multi-worker search.
mod portfolio;
mod sat_parameters;

pub use portfolio::get_diverse_set_of_parameters;
pub use sat_parameters::SatParameters;
pub use sat_parameters::SearchBranching;
