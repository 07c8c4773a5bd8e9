use crate::basic_types::Inconsistency;
use crate::basic_types::Reason;
use crate::engine::termination::Indefinite;
use crate::engine::variables::IntegerLiteral;
use crate::engine::variables::Literal;
use crate::propagators::precedences::test_helper::TestSolver;
use crate::propagators::precedences::GreaterThanAtLeastOneOf;
use crate::propagators::precedences::PrecedencesPropagator;
use crate::propagators::precedences::PresenceProber;
use crate::propagators::precedences::ProbeOutcome;

fn expect_conflict(result: crate::basic_types::PropagationStatusCP) -> Reason {
    match result {
        Err(Inconsistency::Conflict(reason)) => reason,
        other => panic!("expected a conflict, got {other:?}"),
    }
}

#[test]
fn a_chain_of_precedences_pushes_the_lower_bounds() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 10);
    let z = solver.new_variable(0, 10);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 2);
        propagator.add_precedence_with_offset(&mut ctx, y, z, 3);
    }

    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 2, 10);
    solver.assert_bounds(z, 5, 10);

    solver.set_lower_bound(x, 1);
    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 3, 10);
    solver.assert_bounds(z, 6, 10);
}

#[test]
fn propagation_is_idempotent() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 10);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 4);
    }

    solver.propagate(&mut propagator).expect("no conflict");
    let num_entries = solver.integer_trail.num_trail_entries();

    solver.propagate(&mut propagator).expect("no conflict");
    assert_eq!(num_entries, solver.integer_trail.num_trail_entries());
}

#[test]
fn the_push_reason_is_the_tail_bound_and_the_presences() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(3, 10);
    let y = solver.new_variable(0, 10);
    let guard = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, x, y, 2, &[guard]);
    }
    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 0, 10);

    solver.increase_decision_level();
    solver.set_literal_true(guard);
    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 5, 10);

    let reason = solver
        .integer_trail
        .get_reason(IntegerLiteral::greater_or_equal(y, 5))
        .expect("the push was a propagation");
    assert_eq!(
        &Reason::new(vec![!guard], vec![IntegerLiteral::greater_or_equal(x, 3)]),
        reason
    );
}

#[test]
fn a_positive_cycle_is_a_conflict_with_an_empty_reason() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 10);
    let z = solver.new_variable(0, 10);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 1);
        propagator.add_precedence_with_offset(&mut ctx, y, z, 1);
        propagator.add_precedence_with_offset(&mut ctx, z, x, 1);
    }

    let reason = expect_conflict(solver.propagate(&mut propagator));

    // The cycle is infeasible no matter the bounds: both parts of the reason are empty.
    assert!(reason.literals.is_empty());
    assert!(reason.integer_literals.is_empty());
}

#[test]
fn a_blocked_guarded_arc_pushes_its_presence_literal_to_false() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 2);
    let y = solver.new_variable(0, 2);
    let z = solver.new_variable(0, 2);
    let guard = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 1);
        propagator.add_precedence_with_offset(&mut ctx, y, z, 1);
        propagator.add_conditional_precedence_with_offset(&mut ctx, z, x, 1, &[guard]);
    }

    solver.propagate(&mut propagator).expect("no conflict");

    // The unconditional arcs pin every variable, after which lower(z) + 1 > upper(x) and the
    // guarded arc can no longer be present.
    solver.assert_bounds(x, 0, 0);
    solver.assert_bounds(z, 2, 2);
    assert!(solver.boolean_trail.is_literal_assigned_true(!guard));
    let reason = solver
        .boolean_trail
        .get_reason(!guard)
        .expect("the elimination is a propagation");
    assert_eq!(
        &Reason::new(
            vec![],
            vec![
                IntegerLiteral::greater_or_equal(z, 2),
                IntegerLiteral::lower_or_equal(x, 0),
            ]
        ),
        reason
    );
}

#[test]
fn a_cycle_through_live_optional_variables_forces_them_ignored() {
    let mut solver = TestSolver::default();
    let ignored = solver.new_literal();
    let x = solver.new_optional_variable(0, 10, ignored);
    let y = solver.new_optional_variable(0, 10, ignored);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 1);
        propagator.add_precedence_with_offset(&mut ctx, y, x, 1);
    }

    solver.propagate(&mut propagator).expect("no conflict");

    assert!(solver.boolean_trail.is_literal_assigned_true(ignored));
}

#[test]
fn a_cycle_through_present_optional_variables_is_a_conflict() {
    let mut solver = TestSolver::default();
    let ignored = solver.new_literal();
    let x = solver.new_optional_variable(0, 10, ignored);
    let y = solver.new_optional_variable(0, 10, ignored);

    let mut propagator = PrecedencesPropagator::default();
    solver.set_literal_true(!ignored);
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 1);
        propagator.add_precedence_with_offset(&mut ctx, y, x, 1);
    }

    let reason = expect_conflict(solver.propagate(&mut propagator));
    assert_eq!(vec![ignored], reason.literals);
}

#[test]
fn a_push_beyond_the_upper_bound_of_an_optional_head_ignores_it() {
    let mut solver = TestSolver::default();
    let ignored = solver.new_literal();
    let x = solver.new_variable(0, 10);
    let head = solver.new_optional_variable(0, 4, ignored);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, head, 5);
    }

    solver.propagate(&mut propagator).expect("no conflict");

    assert!(solver.boolean_trail.is_literal_assigned_true(ignored));
    solver.assert_bounds(head, 0, 4);
}

#[test]
fn a_conflict_reason_is_relaxed_with_the_available_slack() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 8);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 5);
    }
    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 5, 8);

    solver.increase_decision_level();
    solver.set_lower_bound(x, 6);
    let reason = expect_conflict(solver.propagate(&mut propagator));

    // The slack of 2 weakens [x >= 6] down to [x >= 4], which still pushes y past 8.
    assert_eq!(
        vec![
            IntegerLiteral::greater_or_equal(x, 4),
            IntegerLiteral::lower_or_equal(y, 8),
        ],
        reason.integer_literals
    );
    assert!(reason.literals.is_empty());
}

#[test]
fn untrailing_restores_the_arc_activations() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 10);
    let guard = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, x, y, 2, &[guard]);
    }
    solver.propagate(&mut propagator).expect("no conflict");

    solver.increase_decision_level();
    solver.set_literal_true(guard);
    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 2, 10);
    assert_eq!(Some((guard, 2)), propagator.conditional_relation(x, y));

    solver.backtrack(&mut propagator, 0);
    solver.assert_bounds(y, 0, 10);
    assert_eq!(None, propagator.conditional_relation(x, y));

    // Replaying the same decision reaches the same state.
    solver.increase_decision_level();
    solver.set_literal_true(guard);
    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 2, 10);
    assert_eq!(Some((guard, 2)), propagator.conditional_relation(x, y));
}

#[test]
fn presence_literals_already_true_at_the_root_are_elided() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(1, 10);
    let y = solver.new_variable(0, 10);
    let guard = solver.new_literal();
    solver.set_literal_true(guard);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, x, y, 3, &[guard]);
    }

    solver.propagate(&mut propagator).expect("no conflict");

    // The arc is unconditionally active, so the reason does not mention the guard.
    solver.assert_bounds(y, 4, 10);
    let reason = solver
        .integer_trail
        .get_reason(IntegerLiteral::greater_or_equal(y, 4))
        .expect("the push was a propagation");
    assert!(reason.literals.is_empty());
}

#[test]
fn arcs_with_a_root_false_presence_literal_are_dropped() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(1, 10);
    let y = solver.new_variable(0, 10);
    let guard = solver.new_literal();
    solver.set_literal_true(!guard);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, x, y, 3, &[guard]);
    }

    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 0, 10);
}

#[test]
fn a_variable_offset_contributes_its_lower_bound() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(1, 10);
    let y = solver.new_variable(0, 20);
    let offset_var = solver.new_variable(2, 5);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_variable_offset(&mut ctx, x, y, offset_var);
    }

    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 3, 20);

    solver.set_lower_bound(offset_var, 4);
    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 5, 20);
}

#[test]
fn a_fixed_offset_variable_is_folded_into_the_constant() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(1, 10);
    let y = solver.new_variable(0, 20);
    let offset_var = solver.new_variable(3, 3);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_variable_offset(&mut ctx, x, y, offset_var);
    }

    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 4, 20);

    // A folded offset produces a fixed-offset conditional relation when guarded.
    let guard = solver.new_literal();
    let z = solver.new_variable(0, 20);
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_arc(&mut ctx, x, z, 0, Some(offset_var), &[guard]);
    }
    solver.set_literal_true(guard);
    solver.propagate(&mut propagator).expect("no conflict");
    assert_eq!(Some((guard, 3)), propagator.conditional_relation(x, z));
}

#[test]
fn weaker_precedences_are_not_added_twice() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 10);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 3);
        assert!(!propagator.add_precedence_with_offset_if_new(&mut ctx, x, y, 2));
        assert!(!propagator.add_precedence_with_offset_if_new(&mut ctx, x, y, 3));
        assert!(propagator.add_precedence_with_offset_if_new(&mut ctx, x, y, 5));
    }

    solver.propagate(&mut propagator).expect("no conflict");
    solver.assert_bounds(y, 5, 10);
}

#[test]
fn propagating_outgoing_arcs_only_touches_the_given_variable() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 10);
    let z = solver.new_variable(0, 10);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, y, 2);
        propagator.add_precedence_with_offset(&mut ctx, y, z, 2);
    }

    solver
        .integer_trail
        .tighten_lower_bound(x, 3, None)
        .expect("non-empty");
    {
        let mut ctx = solver.ctx_mut();
        propagator
            .propagate_outgoing_arcs(&mut ctx, x)
            .expect("no conflict");
    }

    // Only the direct successor is pushed.
    solver.assert_bounds(y, 5, 10);
    solver.assert_bounds(z, 0, 10);
}

#[test]
fn compute_precedences_groups_by_head_and_drops_singletons() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 10);
    let z = solver.new_variable(0, 10);
    let w = solver.new_variable(0, 10);

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_precedence_with_offset(&mut ctx, x, z, 2);
        propagator.add_precedence_with_offset(&mut ctx, y, z, 3);
        propagator.add_precedence_with_offset(&mut ctx, x, w, 1);
    }

    let output = propagator.compute_precedences(&solver.ctx(), &[x, y]);

    // w is reachable from a single source and is dropped.
    assert_eq!(2, output.len());
    assert!(output.iter().all(|precedence| precedence.var == z));
    assert_eq!(vec![0, 1], output.iter().map(|p| p.index).collect::<Vec<_>>());
    assert_eq!(vec![2, 3], output.iter().map(|p| p.offset).collect::<Vec<_>>());

    let full = propagator.compute_partial_precedences(&solver.ctx(), &[x, y]);
    assert_eq!(1, full.len());
    assert_eq!(z, full[0].var);
    assert_eq!(vec![0, 1], full[0].indices);
    assert_eq!(vec![2, 3], full[0].offsets);
}

#[test]
fn precedence_reasons_cover_the_presences_and_the_offset_variable() {
    let mut solver = TestSolver::default();
    let x = solver.new_variable(0, 10);
    let y = solver.new_variable(0, 20);
    let offset_var = solver.new_variable(2, 5);
    let guard = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_arc(&mut ctx, x, y, 1, Some(offset_var), &[guard]);
    }
    solver.set_literal_true(guard);
    solver.propagate(&mut propagator).expect("no conflict");

    let output = propagator.compute_precedences(&solver.ctx(), &[x, offset_var]);
    assert_eq!(2, output.len());

    let mut literal_reason = Vec::new();
    let mut integer_reason = Vec::new();
    propagator.add_precedence_reason(
        output[0].arc_index,
        output[0].offset,
        &mut literal_reason,
        &mut integer_reason,
    );
    assert_eq!(vec![!guard], literal_reason);
    assert_eq!(
        vec![IntegerLiteral::greater_or_equal(offset_var, output[0].offset - 1)],
        integer_reason
    );
}

#[test]
fn clauses_over_presences_become_greater_than_at_least_one_of() {
    let mut solver = TestSolver::default();
    let a = solver.new_variable(0, 10);
    let b = solver.new_variable(0, 10);
    let c = solver.new_variable(0, 10);
    let l1 = solver.new_literal();
    let l2 = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, a, c, 2, &[l1]);
        propagator.add_conditional_precedence_with_offset(&mut ctx, b, c, 3, &[l2]);
    }

    let constraints = propagator.add_greater_than_at_least_one_of_constraints(
        &solver.ctx(),
        &[vec![l1, l2]],
        &mut NeverProbed,
        &mut Indefinite,
    );

    assert_eq!(
        vec![GreaterThanAtLeastOneOf {
            target_var: c,
            vars: vec![a, b],
            offsets: vec![2, 3],
            selectors: vec![l1, l2],
            enforcements: vec![],
        }],
        constraints
    );
}

#[test]
fn uncovered_clause_literals_become_enforcements() {
    let mut solver = TestSolver::default();
    let a = solver.new_variable(0, 10);
    let b = solver.new_variable(0, 10);
    let c = solver.new_variable(0, 10);
    let l1 = solver.new_literal();
    let l2 = solver.new_literal();
    let l3 = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, a, c, 2, &[l1]);
        propagator.add_conditional_precedence_with_offset(&mut ctx, b, c, 3, &[l2]);
    }

    let constraints = propagator.greater_than_at_least_one_of_from_clause(
        &solver.ctx(),
        &[l1, l2, l3],
    );

    assert_eq!(1, constraints.len());
    assert_eq!(vec![!l3], constraints[0].enforcements);
}

#[test]
fn a_single_distinct_selector_is_not_worth_a_constraint() {
    let mut solver = TestSolver::default();
    let a = solver.new_variable(0, 10);
    let b = solver.new_variable(0, 10);
    let c = solver.new_variable(0, 10);
    let l1 = solver.new_literal();
    let l2 = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, a, c, 2, &[l1]);
        propagator.add_conditional_precedence_with_offset(&mut ctx, b, c, 3, &[l1]);
    }

    let constraints =
        propagator.greater_than_at_least_one_of_from_clause(&solver.ctx(), &[l1, l2]);

    assert!(constraints.is_empty());
}

#[test]
fn probing_detects_an_at_least_one_set_of_incoming_arcs() {
    let mut solver = TestSolver::default();
    let t1 = solver.new_variable(0, 10);
    let t2 = solver.new_variable(0, 10);
    let c = solver.new_variable(0, 10);
    let p1 = solver.new_literal();
    let p2 = solver.new_literal();

    let mut propagator = PrecedencesPropagator::default();
    {
        let mut ctx = solver.ctx_mut();
        propagator.add_conditional_precedence_with_offset(&mut ctx, t1, c, 2, &[p1]);
        propagator.add_conditional_precedence_with_offset(&mut ctx, t2, c, 3, &[p2]);
    }

    let mut prober = ScriptedProber {
        outcomes: vec![ProbeOutcome::AssumptionsUnsat],
        incompatible: vec![!p1, !p2],
    };
    let constraints =
        propagator.greater_than_at_least_one_of_with_auto_detection(&mut prober, &mut Indefinite);

    assert_eq!(
        vec![GreaterThanAtLeastOneOf {
            target_var: c,
            vars: vec![t1, t2],
            offsets: vec![2, 3],
            selectors: vec![p1, p2],
            enforcements: vec![],
        }],
        constraints
    );
}

/// A prober for tests which must not be consulted.
struct NeverProbed;

impl PresenceProber for NeverProbed {
    fn backtrack_to_root(&mut self) {}

    fn is_unsat(&self) -> bool {
        false
    }

    fn literal_is_false(&self, _literal: Literal) -> bool {
        false
    }

    fn probe_negation(&mut self, _literal: Literal) -> ProbeOutcome {
        panic!("the direct clause scan should not probe")
    }

    fn last_incompatible_decisions(&mut self) -> Vec<Literal> {
        panic!("the direct clause scan should not probe")
    }
}

/// A prober which replays a scripted sequence of outcomes.
struct ScriptedProber {
    outcomes: Vec<ProbeOutcome>,
    incompatible: Vec<Literal>,
}

impl PresenceProber for ScriptedProber {
    fn backtrack_to_root(&mut self) {}

    fn is_unsat(&self) -> bool {
        false
    }

    fn literal_is_false(&self, _literal: Literal) -> bool {
        false
    }

    fn probe_negation(&mut self, _literal: Literal) -> ProbeOutcome {
        self.outcomes.remove(0)
    }

    fn last_incompatible_decisions(&mut self) -> Vec<Literal> {
        self.incompatible.clone()
    }
}
