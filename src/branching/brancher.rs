use crate::branching::BranchingDecision;
use crate::branching::SelectionContext;

/// A branching heuristic: repeatedly asked for the next decision during search.
///
/// Returning [`None`] signals that the heuristic has no candidate left under the current
/// assignment, which hands control to the next heuristic in a chain (see
/// [`SequentialSearch`](crate::branching::SequentialSearch)) or, at the end of the chain,
/// means every variable under consideration is assigned.
///
/// The heuristic must not apply the decision itself; the [`SelectionContext`] is only mutable
/// to allow the use of the random generator.
pub trait Brancher {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<BranchingDecision>;
}
