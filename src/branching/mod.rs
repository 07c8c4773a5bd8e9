//! The branching framework: the [`Brancher`] trait, the strategy-driven implementation over
//! user-declared decision strategies, the domain-specific fallback heuristics and their
//! sequential composition (see [`construct_fixed_search_strategy`]).
mod brancher;
mod decision;
mod first_unassigned;
mod instrumented;
mod scheduling;
mod search_strategy;
mod selection_context;
mod sequential_search;
mod strategy_brancher;

pub use brancher::Brancher;
pub use decision::BooleanDecisionConversionError;
pub use decision::BranchingDecision;
pub use first_unassigned::FirstUnassignedVarAtItsMin;
pub use instrumented::instrument_search_strategy;
pub use instrumented::InstrumentedSearchStrategy;
pub use scheduling::SchedulingSearchHeuristic;
pub use search_strategy::construct_fixed_search_strategy;
pub use search_strategy::construct_user_search_strategy;
pub use selection_context::SelectionContext;
pub use sequential_search::SequentialSearch;
pub use strategy_brancher::DecisionStrategyBrancher;
