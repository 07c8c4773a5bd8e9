mod indefinite;
mod time_budget;

pub use indefinite::Indefinite;
pub use time_budget::TimeBudget;

/// A condition which is polled by long-running root-level procedures (e.g. the clause-driven
/// constraint synthesis) to decide whether to give up on the remaining work.
pub trait TerminationCondition {
    /// Returns `true` when the budget is exhausted and the procedure should stop.
    fn should_stop(&mut self) -> bool;
}
