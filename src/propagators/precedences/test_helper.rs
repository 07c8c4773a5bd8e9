//! A small harness that drives the precedence propagator the way the solver propagation loop
//! would: decisions go through the trails, bound-change events are forwarded to the watcher
//! callback, and backtracking untrails the propagator before synchronising the trails.
use crate::basic_types::PropagationStatusCP;
use crate::engine::variables::IntegerVariable;
use crate::engine::variables::Literal;
use crate::engine::BooleanTrail;
use crate::engine::IntDomainEvent;
use crate::engine::IntegerTrail;
use crate::engine::PropagationContext;
use crate::engine::PropagationContextMut;
use crate::propagators::precedences::PrecedencesPropagator;

#[derive(Default, Debug)]
pub(crate) struct TestSolver {
    pub(crate) boolean_trail: BooleanTrail,
    pub(crate) integer_trail: IntegerTrail,
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, lower_bound: i64, upper_bound: i64) -> IntegerVariable {
        self.integer_trail.grow(lower_bound, upper_bound)
    }

    pub(crate) fn new_literal(&mut self) -> Literal {
        self.boolean_trail.new_literal()
    }

    pub(crate) fn new_optional_variable(
        &mut self,
        lower_bound: i64,
        upper_bound: i64,
        ignored_literal: Literal,
    ) -> IntegerVariable {
        let var = self.integer_trail.grow(lower_bound, upper_bound);
        self.integer_trail.mark_optional(var, ignored_literal);
        var
    }

    pub(crate) fn ctx_mut(&mut self) -> PropagationContextMut<'_> {
        PropagationContextMut::new(&mut self.boolean_trail, &mut self.integer_trail)
    }

    pub(crate) fn ctx(&self) -> PropagationContext<'_> {
        PropagationContext::new(&self.boolean_trail, &self.integer_trail)
    }

    pub(crate) fn lower_bound(&self, var: IntegerVariable) -> i64 {
        self.integer_trail.lower_bound(var)
    }

    pub(crate) fn upper_bound(&self, var: IntegerVariable) -> i64 {
        self.integer_trail.upper_bound(var)
    }

    pub(crate) fn set_lower_bound(&mut self, var: IntegerVariable, bound: i64) {
        self.integer_trail
            .tighten_lower_bound(var, bound, None)
            .expect("the test bound should not empty the domain");
    }

    pub(crate) fn set_literal_true(&mut self, literal: Literal) {
        self.boolean_trail.enqueue_decision(literal);
    }

    pub(crate) fn increase_decision_level(&mut self) {
        self.boolean_trail.increase_decision_level();
        self.integer_trail.increase_decision_level();
    }

    /// Forwards the pending bound-change events to the propagator's watcher callback and runs
    /// a propagation.
    pub(crate) fn propagate(
        &mut self,
        propagator: &mut PrecedencesPropagator,
    ) -> PropagationStatusCP {
        self.notify(propagator);
        let mut ctx = PropagationContextMut::new(&mut self.boolean_trail, &mut self.integer_trail);
        propagator.propagate(&mut ctx)
    }

    pub(crate) fn notify(&mut self, propagator: &mut PrecedencesPropagator) {
        let events = self.integer_trail.drain_events().collect::<Vec<_>>();
        for (event, var) in events {
            if event == IntDomainEvent::LowerBound {
                propagator.notify_lower_bound_changed(var);
            }
        }
    }

    /// Backtracks to `level`: untrails the propagator against the still-intact trail, then
    /// synchronises both trails.
    pub(crate) fn backtrack(&mut self, propagator: &mut PrecedencesPropagator, level: usize) {
        let target_index = self.boolean_trail.num_trail_entries_at_level(level);
        let ctx = PropagationContext::new(&self.boolean_trail, &self.integer_trail);
        propagator.untrail(&ctx, target_index);
        let _ = self.boolean_trail.synchronise(level);
        self.integer_trail.synchronise(level);
    }

    pub(crate) fn assert_bounds(&self, var: IntegerVariable, lb: i64, ub: i64) {
        let actual_lb = self.lower_bound(var);
        let actual_ub = self.upper_bound(var);

        assert_eq!(
            (lb, ub),
            (actual_lb, actual_ub),
            "expected bounds [{lb}..{ub}] but got [{actual_lb}..{actual_ub}]"
        );
    }
}
