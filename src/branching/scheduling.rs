use crate::branching::Brancher;
use crate::branching::BranchingDecision;
use crate::branching::SelectionContext;
use crate::engine::variables::IntegerLiteral;
use crate::engine::variables::IntegerVariable;

/// The fallback [`Brancher`] for models with no-overlap or cumulative constraints: a greedy
/// earliest-start rule which schedules the live variable with the smallest lower bound at that
/// bound.
#[derive(Debug)]
pub struct SchedulingSearchHeuristic {
    start_variables: Vec<IntegerVariable>,
}

impl SchedulingSearchHeuristic {
    pub fn new(start_variables: Vec<IntegerVariable>) -> Self {
        SchedulingSearchHeuristic { start_variables }
    }
}

impl Brancher for SchedulingSearchHeuristic {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<BranchingDecision> {
        let mut best: Option<(IntegerVariable, i64)> = None;
        for &var in &self.start_variables {
            if context.is_integer_fixed(var) || context.is_currently_ignored(var) {
                continue;
            }
            let lower_bound = context.integer_trail().lower_bound(var);
            if best.map_or(true, |(_, best_bound)| lower_bound < best_bound) {
                best = Some((var, lower_bound));
            }
        }
        best.map(|(var, lower_bound)| {
            BranchingDecision::Integer(IntegerLiteral::lower_or_equal(var, lower_bound))
        })
    }
}
