use itertools::Itertools;
use log::debug;

use crate::basic_types::HashSet;
use crate::basic_types::KeyedVec;
use crate::engine::termination::TerminationCondition;
use crate::engine::variables::IntegerVariable;
use crate::engine::variables::Literal;
use crate::engine::variables::PropositionalVariable;
use crate::engine::PropagationContext;
use crate::metronome_asserts::metronome_assert_eq_simple;
use crate::propagators::precedences::ArcIndex;
use crate::propagators::precedences::PrecedencesPropagator;

/// The constraint `head >= min_i(selected tails_i + offsets_i)`: under the `enforcements`, at
/// least one of the `selectors` holds and with it the corresponding precedence.
///
/// Synthesised from clauses over presence literals; posting the constraint is the business of
/// the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GreaterThanAtLeastOneOf {
    pub target_var: IntegerVariable,
    pub vars: Vec<IntegerVariable>,
    pub offsets: Vec<i64>,
    pub selectors: Vec<Literal>,
    pub enforcements: Vec<Literal>,
}

/// The outcome of probing the negation of a presence literal on the external SAT core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The decision was taken and propagation finished without conflict; the decision remains
    /// on the prober's trail.
    Feasible,
    /// The whole model is infeasible.
    Infeasible,
    /// The accumulated decisions are incompatible; the prober backtracked.
    AssumptionsUnsat,
}

/// The slice of the external SAT core used by the clause auto-detection: assuming negations of
/// presence literals one by one and extracting an incompatible subset when propagation fails.
///
/// Decisions accumulate across [`PresenceProber::probe_negation`] calls until
/// [`PresenceProber::backtrack_to_root`] is invoked.
pub trait PresenceProber {
    fn backtrack_to_root(&mut self);

    fn is_unsat(&self) -> bool;

    fn literal_is_false(&self, literal: Literal) -> bool;

    /// Enqueues the negation of `literal` as a decision and propagates.
    fn probe_negation(&mut self, literal: Literal) -> ProbeOutcome;

    /// After [`ProbeOutcome::AssumptionsUnsat`], the set of decisions which cannot hold
    /// together.
    fn last_incompatible_decisions(&mut self) -> Vec<Literal>;
}

impl PrecedencesPropagator {
    /// Scans a level-zero clause `l_1 \/ ... \/ l_n` for "at least one of these precedences
    /// holds" structure: singly-guarded fixed-offset arcs whose guard appears in the clause,
    /// grouped by head. A head reached by at least two arcs spanning (nearly) the whole clause
    /// yields a [`GreaterThanAtLeastOneOf`], with the uncovered clause literals negated as
    /// enforcements.
    pub fn greater_than_at_least_one_of_from_clause(
        &self,
        ctx: &PropagationContext,
        clause: &[Literal],
    ) -> Vec<GreaterThanAtLeastOneOf> {
        metronome_assert_eq_simple!(ctx.decision_level(), 0);
        if clause.len() < 2 {
            return Vec::new();
        }

        // Collect all arcs impacted by this clause.
        let mut infos: Vec<(IntegerVariable, IntegerVariable, i64, Literal)> = Vec::new();
        for &literal in clause {
            for &arc_index in self.new_impacted_arcs_of(literal) {
                let arc = self.arc(arc_index);
                if arc.presence_literals.len() != 1 {
                    continue;
                }
                if arc.offset_var.is_some() {
                    continue;
                }
                infos.push((
                    arc.tail_var,
                    arc.head_var,
                    arc.offset,
                    arc.presence_literals[0],
                ));
            }
        }
        if infos.len() <= 1 {
            return Vec::new();
        }

        // Stable sort by head, so that within a head the entries follow the clause order.
        infos.sort_by_key(|&(_, head_var, _, _)| head_var);

        let mut result = Vec::new();
        for (head_var, group) in &infos.iter().group_by(|info| info.1) {
            let arcs = group.collect_vec();

            // A single arc is already fully propagated on its own.
            if arcs.len() < 2 {
                continue;
            }

            // Only (almost) full clauses are considered; constraints with many enforcement
            // literals do not pay off.
            if arcs.len() + 1 < clause.len() {
                continue;
            }

            let mut vars = Vec::new();
            let mut offsets = Vec::new();
            let mut selectors = Vec::new();
            let mut enforcements = Vec::new();

            let mut j = 0;
            for &literal in clause {
                let mut added = false;
                while j < arcs.len() && literal == arcs[j].3 {
                    added = true;
                    vars.push(arcs[j].0);
                    offsets.push(arcs[j].2);
                    // Duplicate selectors are supported.
                    selectors.push(literal);
                    j += 1;
                }
                if !added {
                    enforcements.push(!literal);
                }
            }

            // Pointless unless at least two distinct selectors remain.
            if enforcements.len() + 1 == clause.len() {
                continue;
            }

            result.push(GreaterThanAtLeastOneOf {
                target_var: head_var,
                vars,
                offsets,
                selectors,
                enforcements,
            });
        }
        result
    }

    /// Synthesises [`GreaterThanAtLeastOneOf`] constraints from the given clause database.
    ///
    /// With a reasonably sized database every clause is scanned directly (including, for each
    /// propositional variable, the implicit clause `{v, ~v}`, since two-alternative
    /// precedences are commonly controlled by a single Boolean). Past a million clauses the
    /// scan switches to probing: for each variable with at least two singly-guarded incoming
    /// arcs, the candidate presences are negated in sequence on `prober` and any infeasibility
    /// identifies an at-least-one set.
    pub fn add_greater_than_at_least_one_of_constraints(
        &self,
        ctx: &PropagationContext,
        clauses: &[Vec<Literal>],
        prober: &mut dyn PresenceProber,
        termination: &mut dyn TerminationCondition,
    ) -> Vec<GreaterThanAtLeastOneOf> {
        const DIRECT_SCAN_LIMIT: usize = 1_000_000;

        let mut result = Vec::new();
        if clauses.len() < DIRECT_SCAN_LIMIT {
            for clause in clauses {
                if termination.should_stop() || prober.is_unsat() {
                    return result;
                }
                result.extend(self.greater_than_at_least_one_of_from_clause(ctx, clause));
            }

            let num_booleans = ctx.boolean_trail.num_propositional_variables() as usize;
            if num_booleans < DIRECT_SCAN_LIMIT {
                for index in 0..num_booleans {
                    if termination.should_stop() || prober.is_unsat() {
                        return result;
                    }
                    let literal = Literal::new(PropositionalVariable::new(index as u32), true);
                    result.extend(
                        self.greater_than_at_least_one_of_from_clause(ctx, &[literal, !literal]),
                    );
                }
            }
        } else {
            result = self.greater_than_at_least_one_of_with_auto_detection(prober, termination);
        }

        if !result.is_empty() {
            debug!(
                "precedences: synthesised {} greater-than-at-least-one-of constraints",
                result.len()
            );
        }
        result
    }

    pub(crate) fn greater_than_at_least_one_of_with_auto_detection(
        &self,
        prober: &mut dyn PresenceProber,
        termination: &mut dyn TerminationCondition,
    ) -> Vec<GreaterThanAtLeastOneOf> {
        // The incoming singly-guarded fixed-offset arcs of each variable.
        let mut incoming_arcs: KeyedVec<IntegerVariable, Vec<ArcIndex>> = KeyedVec::default();
        for arc_index in self.arc_indices() {
            let arc = self.arc(arc_index);
            if arc.offset_var.is_some() {
                continue;
            }
            if arc.tail_var == arc.head_var {
                continue;
            }
            if arc.presence_literals.len() != 1 {
                continue;
            }

            if arc.head_var.index() >= incoming_arcs.len() {
                incoming_arcs.resize(arc.head_var.index() + 1, Vec::new());
            }
            incoming_arcs[arc.head_var].push(arc_index);
        }

        let mut result = Vec::new();
        for target_index in 0..incoming_arcs.len() {
            let target = IntegerVariable::from_index(target_index);
            if incoming_arcs[target].len() <= 1 {
                continue;
            }
            if termination.should_stop() {
                return result;
            }

            // Detect a set of incoming arcs of which at least one must be present.
            prober.backtrack_to_root();
            if prober.is_unsat() {
                return result;
            }
            let mut clause = Vec::new();
            for &arc_index in &incoming_arcs[target] {
                let literal = self.arc(arc_index).presence_literals[0];
                if prober.literal_is_false(literal) {
                    continue;
                }
                match prober.probe_negation(literal) {
                    ProbeOutcome::Infeasible => return result,
                    ProbeOutcome::AssumptionsUnsat => {
                        clause = prober.last_incompatible_decisions();
                        break;
                    }
                    ProbeOutcome::Feasible => {}
                }
            }
            prober.backtrack_to_root();

            if clause.len() > 1 {
                // Extract the arcs of which at least one must be present.
                let clause_set: HashSet<Literal> = clause.iter().copied().collect();
                let mut vars = Vec::new();
                let mut offsets = Vec::new();
                let mut selectors = Vec::new();
                for &arc_index in &incoming_arcs[target] {
                    let arc = self.arc(arc_index);
                    let literal = arc.presence_literals[0];
                    if clause_set.contains(&!literal) {
                        vars.push(arc.tail_var);
                        offsets.push(arc.offset);
                        selectors.push(literal);
                    }
                }
                result.push(GreaterThanAtLeastOneOf {
                    target_var: target,
                    vars,
                    offsets,
                    selectors,
                    enforcements: Vec::new(),
                });
            }
        }

        result
    }
}
