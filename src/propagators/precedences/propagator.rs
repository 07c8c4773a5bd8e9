use std::collections::VecDeque;

use log::debug;
use log::warn;

use crate::basic_types::HashMap;
use crate::basic_types::Inconsistency;
use crate::basic_types::KeyedVec;
use crate::basic_types::PropagationStatusCP;
use crate::basic_types::Reason;
use crate::basic_types::SparseBitset;
use crate::basic_types::StorageKey;
use crate::engine::variables::IntegerLiteral;
use crate::engine::variables::IntegerVariable;
use crate::engine::variables::Literal;
use crate::engine::IntegerTrail;
use crate::engine::PropagationContext;
use crate::engine::PropagationContextMut;
use crate::metronome_asserts::metronome_assert_eq_simple;
use crate::metronome_asserts::metronome_assert_moderate;
use crate::metronome_asserts::metronome_assert_simple;
use crate::propagators::precedences::FullPrecedence;

/// The identifier of an internal arc of the [`PrecedencesPropagator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArcIndex(u32);

impl StorageKey for ArcIndex {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        ArcIndex(index as u32)
    }
}

/// The identifier of a not-yet-active arc awaiting its presence literals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PotentialArcIndex(u32);

impl StorageKey for PotentialArcIndex {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        PotentialArcIndex(index as u32)
    }
}

/// A conditional precedence: when all presence literals are true and the offset variable (if
/// any) has lower bound `l`, then `lower(head_var) >= lower(tail_var) + offset + l`.
#[derive(Clone, Debug)]
pub(crate) struct ArcInfo {
    pub(crate) tail_var: IntegerVariable,
    pub(crate) head_var: IntegerVariable,
    pub(crate) offset: i64,
    pub(crate) offset_var: Option<IntegerVariable>,
    pub(crate) presence_literals: Vec<Literal>,
    /// Whether this arc is currently the recorded parent of its head in the propagation
    /// forest.
    is_marked: bool,
}

/// An entry of [`PrecedencesPropagator::compute_precedences`]: the variable at `index` in the
/// queried list lies at least `offset` before `var` through the active arc `arc_index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegerPrecedence {
    pub index: usize,
    pub var: IntegerVariable,
    pub arc_index: ArcIndex,
    pub offset: i64,
}

#[derive(Clone, Copy, Debug)]
struct SortedVar {
    var: IntegerVariable,
    lower_bound: i64,
}

/// An incremental propagator for precedence relations `tail + offset <= head`, optionally with
/// a variable offset and optionally enforced by a conjunction of presence literals.
///
/// Each relation materialises internal arcs on both orientations (six of them when an offset
/// variable is involved, covering all rotations of `a + c + offset <= b`). An arc carries a
/// count of its presence literals not yet known to be true; when the count reaches zero the
/// arc becomes active and is installed in the per-variable outgoing lists. Activation and
/// deactivation are exactly inverse in literal-trail order, which is what keeps the counts
/// correct under arbitrary backtracking.
///
/// Lower bounds are propagated with a Bellman-Ford pass over the active arcs, using Tarjan's
/// subtree-disassembly trick on a parent-arc forest to detect positive-weight cycles. A
/// positive cycle is a conflict, unless it runs through optional variables which are still
/// live, in which case those are inferred to be ignored instead.
#[derive(Debug, Default)]
pub struct PrecedencesPropagator {
    arcs: KeyedVec<ArcIndex, ArcInfo>,
    /// Number of presence literals of each arc not yet known to be true; the arc is active at
    /// zero.
    arc_counts: KeyedVec<ArcIndex, u32>,
    /// Active outgoing arcs of each view.
    impacted_arcs: KeyedVec<IntegerVariable, Vec<ArcIndex>>,

    potential_arcs: KeyedVec<PotentialArcIndex, ArcInfo>,
    /// Pending arcs mentioning the view as tail, negated head or offset variable.
    impacted_potential_arcs: KeyedVec<IntegerVariable, Vec<PotentialArcIndex>>,

    /// The arcs which become one step closer to activation when the literal becomes true.
    literal_to_new_impacted_arcs: KeyedVec<Literal, Vec<ArcIndex>>,

    /// High-water mark into the Boolean trail of the assignments processed so far.
    propagation_trail_index: usize,

    /// Views whose lower bound changed since the last propagation; fed by the bound watcher
    /// and by this propagator's own pushes.
    modified_vars: SparseBitset,

    /// `(tail, head) -> (literal, offset)` for the active singly-guarded fixed-offset arcs.
    conditional_relations: HashMap<(IntegerVariable, IntegerVariable), (Literal, i64)>,

    // State of the Bellman-Ford queue, indexed by view.
    bf_queue: VecDeque<usize>,
    bf_in_queue: Vec<bool>,
    bf_can_be_skipped: Vec<bool>,
    bf_parent_arc_of: Vec<Option<ArcIndex>>,
    tmp_vector: Vec<usize>,

    // Scratch space of compute_precedences.
    var_to_degree: KeyedVec<IntegerVariable, i32>,
    var_to_last_index: KeyedVec<IntegerVariable, i64>,

    num_cycles: u64,
    num_pushes: u64,
    num_enforcement_pushes: u64,
}

impl PrecedencesPropagator {
    /// Adds the precedence `tail <= head`.
    pub fn add_precedence(
        &mut self,
        ctx: &mut PropagationContextMut,
        tail: IntegerVariable,
        head: IntegerVariable,
    ) {
        self.add_arc(ctx, tail, head, 0, None, &[]);
    }

    /// Adds the precedence `tail + offset <= head`.
    pub fn add_precedence_with_offset(
        &mut self,
        ctx: &mut PropagationContextMut,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i64,
    ) {
        self.add_arc(ctx, tail, head, offset, None, &[]);
    }

    /// Adds the precedence `tail + offset_var <= head`.
    pub fn add_precedence_with_variable_offset(
        &mut self,
        ctx: &mut PropagationContextMut,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset_var: IntegerVariable,
    ) {
        self.add_arc(ctx, tail, head, 0, Some(offset_var), &[]);
    }

    /// Adds `tail + offset <= head`, enforced when all `presence_literals` are true.
    pub fn add_conditional_precedence_with_offset(
        &mut self,
        ctx: &mut PropagationContextMut,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i64,
        presence_literals: &[Literal],
    ) {
        self.add_arc(ctx, tail, head, offset, None, presence_literals);
    }

    /// Generic entry point: `tail + offset + offset_var <= head` enforced by the conjunction
    /// of `presence_literals`.
    ///
    /// Optional variables among the endpoints contribute the negation of their ignore literal
    /// to the enforcement. At decision level zero, presence literals which are already true
    /// are elided and an already-false literal drops the arc entirely.
    pub fn add_arc(
        &mut self,
        ctx: &mut PropagationContextMut,
        tail: IntegerVariable,
        head: IntegerVariable,
        mut offset: i64,
        mut offset_var: Option<IntegerVariable>,
        presence_literals: &[Literal],
    ) {
        self.adjust_size_for(tail);
        self.adjust_size_for(head);
        if let Some(offset_variable) = offset_var {
            self.adjust_size_for(offset_variable);
        }

        // This arc is present iff all the literals here are true.
        let mut enforcement_literals = presence_literals.to_vec();
        if let Some(literal) = ctx.integer_trail.ignored_literal(tail) {
            enforcement_literals.push(!literal);
        }
        if let Some(literal) = ctx.integer_trail.ignored_literal(head) {
            enforcement_literals.push(!literal);
        }
        if let Some(literal) = offset_var.and_then(|v| ctx.integer_trail.ignored_literal(v)) {
            enforcement_literals.push(!literal);
        }
        enforcement_literals.sort_unstable();
        enforcement_literals.dedup();

        if ctx.decision_level() == 0 {
            let mut filtered = Vec::with_capacity(enforcement_literals.len());
            for &literal in &enforcement_literals {
                if ctx.boolean_trail.is_literal_assigned_true(literal) {
                    continue;
                }
                if ctx.boolean_trail.is_literal_assigned_false(literal) {
                    // The arc can never be present.
                    return;
                }
                filtered.push(literal);
            }
            enforcement_literals = filtered;
        }

        if head == tail {
            // A self-arc is either plain SAT or plain UNSAT or it forces something on the
            // offset variable or the presence literals. It could be presolved into something
            // more efficient.
            warn!(
                "self arc: var={} offset={} offset_var={:?} conditioned by {:?}",
                tail, offset, offset_var, enforcement_literals
            );
        }

        // Fold a fixed offset variable into the constant offset.
        if let Some(offset_variable) = offset_var {
            let lb = ctx.integer_trail.level_zero_lower_bound(offset_variable);
            if lb == ctx.integer_trail.level_zero_upper_bound(offset_variable) {
                offset += lb;
                offset_var = None;
            }
        }

        if !enforcement_literals.is_empty() {
            let arc_index = self.potential_arcs.push(ArcInfo {
                tail_var: tail,
                head_var: head,
                offset,
                offset_var,
                presence_literals: enforcement_literals.clone(),
                is_marked: false,
            });
            self.impacted_potential_arcs[tail].push(arc_index);
            self.impacted_potential_arcs[head.negation()].push(arc_index);
            if let Some(offset_variable) = offset_var {
                self.impacted_potential_arcs[offset_variable].push(arc_index);
            }
        }

        let to_add: Vec<(IntegerVariable, IntegerVariable, Option<IntegerVariable>)> =
            match offset_var {
                None => vec![
                    // a + offset <= b and -b + offset <= -a
                    (tail, head, None),
                    (head.negation(), tail.negation(), None),
                ],
                Some(offset_variable) => vec![
                    // The tail (a) and the offset variable (b) are symmetric, so with head c:
                    // a + b + offset <= c
                    (tail, head, Some(offset_variable)),
                    (offset_variable, head, Some(tail)),
                    // a - c + offset <= -b
                    (tail, offset_variable.negation(), Some(head.negation())),
                    (head.negation(), offset_variable.negation(), Some(tail)),
                    // b - c + offset <= -a
                    (offset_variable, tail.negation(), Some(head.negation())),
                    (head.negation(), tail.negation(), Some(offset_variable)),
                ],
            };

        for (tail_var, head_var, internal_offset_var) in to_add {
            // The new arc must be considered during the next propagation.
            self.modified_vars.set(tail_var.index());

            // If the head is optional, the arc is vacuous whenever the head is ignored, so the
            // corresponding enforcement can be dropped from this orientation.
            let mut arc_presence = enforcement_literals.clone();
            if let Some(ignored) = ctx.integer_trail.ignored_literal(head_var) {
                let to_remove = !ignored;
                if let Some(position) = arc_presence.iter().position(|&l| l == to_remove) {
                    let _ = arc_presence.remove(position);
                }
            }

            let arc_index = self.arcs.push(ArcInfo {
                tail_var,
                head_var,
                offset,
                offset_var: internal_offset_var,
                presence_literals: arc_presence.clone(),
                is_marked: false,
            });

            if arc_presence.is_empty() {
                self.impacted_arcs[tail_var].push(arc_index);
            } else {
                for &literal in &arc_presence {
                    if literal.index() >= self.literal_to_new_impacted_arcs.len() {
                        self.literal_to_new_impacted_arcs
                            .resize(literal.index() + 1, Vec::new());
                    }
                    self.literal_to_new_impacted_arcs[literal].push(arc_index);
                }
            }

            let count = if ctx.decision_level() == 0 {
                arc_presence.len() as u32
            } else {
                arc_presence
                    .iter()
                    .filter(|&&literal| !ctx.boolean_trail.is_literal_assigned_true(literal))
                    .count() as u32
            };
            metronome_assert_moderate!(arc_presence.is_empty() || count > 0);
            let _ = self.arc_counts.push(count);
        }
    }

    /// At decision level zero, adds `tail + offset <= head` unless an existing arc between the
    /// two already dominates the offset. Returns whether an arc was added.
    pub fn add_precedence_with_offset_if_new(
        &mut self,
        ctx: &mut PropagationContextMut,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i64,
    ) -> bool {
        metronome_assert_eq_simple!(ctx.decision_level(), 0);
        if tail.index() < self.impacted_arcs.len() && head.index() < self.impacted_arcs.len() {
            for i in 0..self.impacted_arcs[tail].len() {
                let arc_index = self.impacted_arcs[tail][i];
                if self.arcs[arc_index].head_var == head {
                    let current = self.arc_offset(ctx.integer_trail, arc_index);
                    if offset <= current {
                        return false;
                    }
                    break;
                }
            }
        }

        self.add_precedence_with_offset(ctx, tail, head, offset);
        true
    }

    /// The bound watcher callback: records that the lower bound of the view changed since the
    /// last propagation.
    pub fn notify_lower_bound_changed(&mut self, var: IntegerVariable) {
        self.modified_vars.set(var.index());
    }

    /// Runs the propagation to a fixed point: processes the newly assigned literals to
    /// activate arcs, runs the Bellman-Ford pass from the modified variables and finally tries
    /// to eliminate pending optional arcs.
    pub fn propagate(&mut self, ctx: &mut PropagationContextMut) -> PropagationStatusCP {
        while self.propagation_trail_index < ctx.boolean_trail.num_trail_entries() {
            let literal = ctx.boolean_trail.get_trail_entry(self.propagation_trail_index);
            self.propagation_trail_index += 1;
            if literal.index() >= self.literal_to_new_impacted_arcs.len() {
                continue;
            }

            // Because Untrail() mirrors the activations, all the arcs of this literal must be
            // installed before any conflict can abort the propagation; hence two passes.
            for i in 0..self.literal_to_new_impacted_arcs[literal].len() {
                let arc_index = self.literal_to_new_impacted_arcs[literal][i];
                self.arc_counts[arc_index] -= 1;
                if self.arc_counts[arc_index] == 0 {
                    self.add_to_conditional_relations(ctx.integer_trail, arc_index);
                    let tail_var = self.arcs[arc_index].tail_var;
                    self.impacted_arcs[tail_var].push(arc_index);
                }
            }

            // Second pass: check each newly active arc for a push.
            for i in 0..self.literal_to_new_impacted_arcs[literal].len() {
                let arc_index = self.literal_to_new_impacted_arcs[literal][i];
                if self.arc_counts[arc_index] > 0 {
                    continue;
                }
                let (tail_var, head_var) = {
                    let arc = &self.arcs[arc_index];
                    (arc.tail_var, arc.head_var)
                };
                if ctx.is_currently_ignored(head_var) {
                    continue;
                }
                let new_head_lb = ctx.integer_trail.lower_bound(tail_var)
                    + self.arc_offset(ctx.integer_trail, arc_index);
                if new_head_lb > ctx.integer_trail.lower_bound(head_var) {
                    self.enqueue_and_check(ctx, arc_index, new_head_lb)?;
                }
            }
        }

        // The actual propagation of the integer bounds.
        self.initialize_bf_queue_with_modified_nodes();
        self.bellman_ford_tarjan(ctx)?;

        // Propagate the presence literals of the arcs that can no longer be added.
        self.propagate_optional_arcs(ctx);

        // Keep the next call as cheap as possible.
        self.modified_vars
            .clear_and_resize(ctx.integer_trail.num_integer_variables());
        Ok(())
    }

    /// Propagates only the active outgoing arcs of `var`; an entry point for cooperating
    /// propagators which just raised the bound of a single variable.
    pub fn propagate_outgoing_arcs(
        &mut self,
        ctx: &mut PropagationContextMut,
        var: IntegerVariable,
    ) -> PropagationStatusCP {
        if var.index() >= self.impacted_arcs.len() {
            return Ok(());
        }
        for i in 0..self.impacted_arcs[var].len() {
            let arc_index = self.impacted_arcs[var][i];
            let (tail_var, head_var) = {
                let arc = &self.arcs[arc_index];
                (arc.tail_var, arc.head_var)
            };
            if ctx.is_currently_ignored(head_var) {
                continue;
            }
            let new_head_lb = ctx.integer_trail.lower_bound(tail_var)
                + self.arc_offset(ctx.integer_trail, arc_index);
            if new_head_lb > ctx.integer_trail.lower_bound(head_var) {
                self.enqueue_and_check(ctx, arc_index, new_head_lb)?;
            }
        }
        Ok(())
    }

    /// Rewinds the processed prefix of the Boolean trail to `trail_index`, deactivating the
    /// arcs in exactly the reverse order of their activation.
    pub fn untrail(&mut self, ctx: &PropagationContext, trail_index: usize) {
        if self.propagation_trail_index > trail_index {
            // Everything up to trail_index was already propagated, so nothing is modified
            // anymore once the counts are restored.
            self.modified_vars
                .clear_and_resize(ctx.integer_trail.num_integer_variables());
        }
        while self.propagation_trail_index > trail_index {
            self.propagation_trail_index -= 1;
            let literal = ctx.boolean_trail.get_trail_entry(self.propagation_trail_index);
            if literal.index() >= self.literal_to_new_impacted_arcs.len() {
                continue;
            }
            for i in 0..self.literal_to_new_impacted_arcs[literal].len() {
                let arc_index = self.literal_to_new_impacted_arcs[literal][i];
                if self.arc_counts[arc_index] == 0 {
                    self.remove_from_conditional_relations(arc_index);
                    let tail_var = self.arcs[arc_index].tail_var;
                    let _ = self.impacted_arcs[tail_var].pop();
                }
                self.arc_counts[arc_index] += 1;
            }
        }
    }

    /// For each variable in `vars`, walks its active outgoing arcs and groups the discovered
    /// precedences by head variable. Heads reached from a single source are dropped, and
    /// within a group each source appears at most once.
    pub fn compute_precedences(
        &mut self,
        ctx: &PropagationContext,
        vars: &[IntegerVariable],
    ) -> Vec<IntegerPrecedence> {
        let mut sorted_vars: Vec<SortedVar> = Vec::new();
        let mut precedences: Vec<IntegerPrecedence> = Vec::new();
        for (index, &var) in vars.iter().enumerate() {
            if var.index() >= self.impacted_arcs.len() {
                continue;
            }
            for i in 0..self.impacted_arcs[var].len() {
                let arc_index = self.impacted_arcs[var][i];
                let (head_var, offset_var, base_offset) = {
                    let arc = &self.arcs[arc_index];
                    (arc.head_var, arc.offset_var, arc.offset)
                };
                if ctx.is_currently_ignored(head_var) {
                    continue;
                }

                let mut offset = base_offset;
                if let Some(offset_variable) = offset_var {
                    offset += ctx.integer_trail.lower_bound(offset_variable);
                }

                // Negative offsets usually come from reversed interval relations and do not
                // help the callers.
                if offset < 0 {
                    continue;
                }

                if self.var_to_degree[head_var] == 0 {
                    sorted_vars.push(SortedVar {
                        var: head_var,
                        lower_bound: ctx.integer_trail.lower_bound(head_var),
                    });
                } else if self.var_to_last_index[head_var] == index as i64 {
                    // A multi-arc duplicate for this source; keep a single entry.
                    continue;
                }
                self.var_to_last_index[head_var] = index as i64;
                self.var_to_degree[head_var] += 1;
                precedences.push(IntegerPrecedence {
                    index,
                    var: head_var,
                    arc_index,
                    offset,
                });
            }
        }

        // With non-negative offsets, ordering the heads by current lower bound is a
        // topological order of the precedence relation.
        sorted_vars.sort_unstable_by_key(|entry| (entry.lower_bound, entry.var.index()));

        // Transform var_to_degree into the start position of each head group in the output,
        // dropping the degree-one groups.
        let mut start: i32 = 0;
        for entry in &sorted_vars {
            let degree = self.var_to_degree[entry.var];
            if degree > 1 {
                self.var_to_degree[entry.var] = start;
                start += degree;
            } else {
                self.var_to_degree[entry.var] = -1;
            }
        }

        let mut output: Vec<Option<IntegerPrecedence>> = vec![None; start as usize];
        for precedence in precedences {
            let position = self.var_to_degree[precedence.var];
            if position < 0 {
                continue;
            }
            self.var_to_degree[precedence.var] += 1;
            output[position as usize] = Some(precedence);
        }

        // Reset the scratch degrees; the last-index markers do not need cleaning.
        for entry in &sorted_vars {
            self.var_to_degree[entry.var] = 0;
        }

        output
            .into_iter()
            .map(|entry| entry.expect("every reserved position is filled"))
            .collect()
    }

    /// [`PrecedencesPropagator::compute_precedences`] with the output grouped per head
    /// variable in the full-precedence format.
    pub fn compute_partial_precedences(
        &mut self,
        ctx: &PropagationContext,
        vars: &[IntegerVariable],
    ) -> Vec<FullPrecedence> {
        metronome_assert_eq_simple!(ctx.decision_level(), 0);

        let before = self.compute_precedences(ctx, vars);

        let mut output: Vec<FullPrecedence> = Vec::new();
        for precedence in before {
            if output.last().map_or(true, |full| full.var != precedence.var) {
                output.push(FullPrecedence {
                    var: precedence.var,
                    indices: Vec::new(),
                    offsets: Vec::new(),
                });
            }
            let group = output.last_mut().expect("just pushed");
            group.indices.push(precedence.index);
            group.offsets.push(precedence.offset);
        }
        output
    }

    /// Appends to the given reason the conditions under which the arc provides an offset of at
    /// least `min_offset`: the negated presence literals plus, for a variable offset, the
    /// matching bound on the offset variable.
    pub fn add_precedence_reason(
        &self,
        arc_index: ArcIndex,
        min_offset: i64,
        literal_reason: &mut Vec<Literal>,
        integer_reason: &mut Vec<IntegerLiteral>,
    ) {
        let arc = &self.arcs[arc_index];
        for &literal in &arc.presence_literals {
            literal_reason.push(!literal);
        }
        if let Some(offset_variable) = arc.offset_var {
            integer_reason.push(IntegerLiteral::greater_or_equal(
                offset_variable,
                min_offset - arc.offset,
            ));
        }
    }

    /// The `(literal, offset)` guard of the currently active singly-guarded fixed-offset arc
    /// from `tail` to `head`, if any.
    pub fn conditional_relation(
        &self,
        tail: IntegerVariable,
        head: IntegerVariable,
    ) -> Option<(Literal, i64)> {
        self.conditional_relations.get(&(tail, head)).copied()
    }

    pub fn log_statistics(&self) {
        debug!(
            "precedences: num_cycles={} num_pushes={} num_enforcement_pushes={}",
            self.num_cycles, self.num_pushes, self.num_enforcement_pushes
        );
    }

    pub(crate) fn new_impacted_arcs_of(&self, literal: Literal) -> &[ArcIndex] {
        if literal.index() < self.literal_to_new_impacted_arcs.len() {
            &self.literal_to_new_impacted_arcs[literal]
        } else {
            &[]
        }
    }

    pub(crate) fn arc(&self, arc_index: ArcIndex) -> &ArcInfo {
        &self.arcs[arc_index]
    }

    pub(crate) fn arc_indices(&self) -> impl Iterator<Item = ArcIndex> + '_ {
        self.arcs.keys()
    }

    fn adjust_size_for(&mut self, var: IntegerVariable) {
        let index = var.index().max(var.negation().index());
        if index >= self.impacted_arcs.len() {
            self.impacted_arcs.resize(index + 1, Vec::new());
            self.impacted_potential_arcs.resize(index + 1, Vec::new());
            self.var_to_degree.resize(index + 1, 0);
            self.var_to_last_index.resize(index + 1, -1);
        }
    }

    fn arc_offset(&self, integer_trail: &IntegerTrail, arc_index: ArcIndex) -> i64 {
        arc_offset_of(integer_trail, &self.arcs[arc_index])
    }

    fn add_to_conditional_relations(
        &mut self,
        integer_trail: &IntegerTrail,
        arc_index: ArcIndex,
    ) {
        let (key, value) = {
            let arc = &self.arcs[arc_index];
            if arc.presence_literals.len() != 1 || arc.offset_var.is_some() {
                return;
            }
            (
                (arc.tail_var, arc.head_var),
                (arc.presence_literals[0], arc_offset_of(integer_trail, arc)),
            )
        };
        // Only the first activation for a pair is recorded.
        let _ = self.conditional_relations.entry(key).or_insert(value);
    }

    fn remove_from_conditional_relations(&mut self, arc_index: ArcIndex) {
        let (key, literal) = {
            let arc = &self.arcs[arc_index];
            if arc.presence_literals.len() != 1 || arc.offset_var.is_some() {
                return;
            }
            ((arc.tail_var, arc.head_var), arc.presence_literals[0])
        };
        if self
            .conditional_relations
            .get(&key)
            .is_some_and(|&(guard, _)| guard == literal)
        {
            let _ = self.conditional_relations.remove(&key);
        }
    }

    /// Pushes `lower(head) >= new_head_lb` with the proper reason. When the push crosses the
    /// upper bound of the head this is a conflict with a relaxable linear reason, except for a
    /// still-live optional head, whose ignore literal is propagated instead.
    fn enqueue_and_check(
        &mut self,
        ctx: &mut PropagationContextMut,
        arc_index: ArcIndex,
        new_head_lb: i64,
    ) -> PropagationStatusCP {
        self.num_pushes += 1;
        let (tail_var, head_var, offset_var, mut literal_reason) = {
            let arc = &self.arcs[arc_index];
            (
                arc.tail_var,
                arc.head_var,
                arc.offset_var,
                arc.presence_literals
                    .iter()
                    .map(|&literal| !literal)
                    .collect::<Vec<_>>(),
            )
        };
        metronome_assert_moderate!(new_head_lb > ctx.integer_trail.lower_bound(head_var));

        let mut integer_reason = vec![ctx.integer_trail.lower_bound_as_literal(tail_var)];
        if let Some(offset_variable) = offset_var {
            integer_reason.push(ctx.integer_trail.lower_bound_as_literal(offset_variable));
        }

        if new_head_lb > ctx.integer_trail.upper_bound(head_var) {
            // A precedence conflict has a linear reason: the tail lower bound plus the offsets
            // against the head upper bound. That makes it relaxable with the available slack.
            let slack = new_head_lb - ctx.integer_trail.upper_bound(head_var) - 1;
            integer_reason.push(ctx.integer_trail.upper_bound_as_literal(head_var));
            let coefficients = vec![1; integer_reason.len()];
            ctx.integer_trail
                .relax_linear_reason(slack, &coefficients, &mut integer_reason);

            if !ctx.integer_trail.is_optional(head_var) {
                return Err(Inconsistency::Conflict(Reason::new(
                    literal_reason,
                    integer_reason,
                )));
            }

            let ignored = ctx
                .integer_trail
                .ignored_literal(head_var)
                .expect("optional variables carry an ignore literal");
            metronome_assert_simple!(!ctx.is_currently_ignored(head_var));
            if ctx.boolean_trail.is_literal_assigned_false(ignored) {
                literal_reason.push(ignored);
                return Err(Inconsistency::Conflict(Reason::new(
                    literal_reason,
                    integer_reason,
                )));
            }
            ctx.enqueue_literal(ignored, Reason::new(literal_reason, integer_reason));
            return Ok(());
        }

        ctx.enqueue(
            IntegerLiteral::greater_or_equal(head_var, new_head_lb),
            Reason::new(literal_reason, integer_reason),
        )?;
        self.modified_vars.set(head_var.index());
        Ok(())
    }

    fn initialize_bf_queue_with_modified_nodes(&mut self) {
        let num_nodes = self.impacted_arcs.len();
        while let Some(node) = self.bf_queue.pop_front() {
            if node < self.bf_in_queue.len() {
                self.bf_in_queue[node] = false;
            }
        }
        self.bf_in_queue.resize(num_nodes, false);

        for i in 0..self.modified_vars.num_positions() {
            let var = self.modified_vars.position(i);
            if var >= num_nodes {
                continue;
            }
            self.bf_queue.push_back(var);
            self.bf_in_queue[var] = true;
        }
    }

    fn bellman_ford_tarjan(&mut self, ctx: &mut PropagationContextMut) -> PropagationStatusCP {
        let num_nodes = self.impacted_arcs.len();
        self.bf_can_be_skipped.resize(num_nodes, false);
        self.bf_parent_arc_of.resize(num_nodes, None);

        let status = self.bellman_ford_tarjan_inner(ctx);
        self.clean_up_marked_arcs_and_parents();
        status
    }

    fn bellman_ford_tarjan_inner(
        &mut self,
        ctx: &mut PropagationContextMut,
    ) -> PropagationStatusCP {
        while let Some(node) = self.bf_queue.pop_front() {
            self.bf_in_queue[node] = false;

            // A node in a disassembled subtree will be pushed again later anyway; propagating
            // it now would be wasted work.
            if self.bf_can_be_skipped[node] {
                metronome_assert_moderate!(self.bf_parent_arc_of[node]
                    .is_some_and(|parent_arc| !self.arcs[parent_arc].is_marked));
                continue;
            }

            let node_var = IntegerVariable::from_index(node);
            let tail_lb = ctx.integer_trail.lower_bound(node_var);
            for i in 0..self.impacted_arcs[node_var].len() {
                let arc_index = self.impacted_arcs[node_var][i];
                let head_var = self.arcs[arc_index].head_var;
                let candidate = tail_lb + self.arc_offset(ctx.integer_trail, arc_index);
                if candidate <= ctx.integer_trail.lower_bound(head_var) {
                    continue;
                }
                if ctx.is_currently_ignored(head_var) {
                    continue;
                }
                self.enqueue_and_check(ctx, arc_index, candidate)?;

                // The Tarjan contribution: disassembling the subtree of the pushed node both
                // detects positive cycles and amortises the work, since disassembled nodes
                // are marked skippable until pushed again.
                if self.disassemble_subtree(head_var.index(), node) {
                    let (must_be_all_true, mut literal_reason, integer_reason) =
                        self.analyze_positive_cycle(ctx.integer_trail, arc_index);
                    if must_be_all_true.is_empty() {
                        self.num_cycles += 1;
                        return Err(Inconsistency::Conflict(Reason::new(
                            literal_reason,
                            integer_reason,
                        )));
                    }

                    // The cycle runs through optional variables which are still live; they
                    // must all be ignored rather than raising a conflict.
                    let mut must_be_all_true = must_be_all_true;
                    must_be_all_true.sort_unstable();
                    must_be_all_true.dedup();
                    for &literal in &must_be_all_true {
                        if ctx.boolean_trail.is_literal_assigned_false(literal) {
                            literal_reason.push(literal);
                            return Err(Inconsistency::Conflict(Reason::new(
                                literal_reason,
                                integer_reason,
                            )));
                        }
                    }
                    for &literal in &must_be_all_true {
                        if ctx.boolean_trail.is_literal_assigned_true(literal) {
                            continue;
                        }
                        ctx.enqueue_literal(
                            literal,
                            Reason::new(literal_reason.clone(), integer_reason.clone()),
                        );
                    }

                    // Only optional variables were marked ignored; the parent pointers are
                    // unchanged.
                    continue;
                }

                let head = head_var.index();
                // Only the arcs recorded in bf_parent_arc_of may be marked.
                if let Some(previous_parent) = self.bf_parent_arc_of[head] {
                    self.arcs[previous_parent].is_marked = false;
                }

                // The trail may have raised the head beyond the candidate (discrete domains).
                // Keeping the parent cleared in that case prevents this extra push from being
                // diagnosed as a positive cycle.
                let new_bound = ctx.integer_trail.lower_bound(head_var);
                if new_bound == candidate {
                    self.bf_parent_arc_of[head] = Some(arc_index);
                    self.arcs[arc_index].is_marked = true;
                } else {
                    self.bf_parent_arc_of[head] = None;
                }

                // Do not re-enqueue a node stuck below its candidate: that only happens in a
                // propagation loop and it will be pushed again from elsewhere.
                self.bf_can_be_skipped[head] = false;
                if !self.bf_in_queue[head] && new_bound >= candidate {
                    self.bf_queue.push_back(head);
                    self.bf_in_queue[head] = true;
                }
            }
        }
        Ok(())
    }

    fn clean_up_marked_arcs_and_parents(&mut self) {
        // Every node with a parent is in modified_vars, so the sweep is sparse.
        let num_nodes = self.bf_parent_arc_of.len();
        for i in 0..self.modified_vars.num_positions() {
            let var = self.modified_vars.position(i);
            if var >= num_nodes {
                continue;
            }
            if let Some(parent_arc) = self.bf_parent_arc_of[var] {
                self.arcs[parent_arc].is_marked = false;
                self.bf_parent_arc_of[var] = None;
                self.bf_can_be_skipped[var] = false;
            }
        }
    }

    /// Unmarks the parent arcs of all descendants of `source`, marking them as skippable. If
    /// `target` is reached, `source` is a descendant of `target` and a positive cycle exists.
    fn disassemble_subtree(&mut self, source: usize, target: usize) -> bool {
        self.tmp_vector.clear();
        self.tmp_vector.push(source);
        while let Some(tail) = self.tmp_vector.pop() {
            let tail_var = IntegerVariable::from_index(tail);
            for i in 0..self.impacted_arcs[tail_var].len() {
                let arc_index = self.impacted_arcs[tail_var][i];
                if !self.arcs[arc_index].is_marked {
                    continue;
                }
                self.arcs[arc_index].is_marked = false;
                let head = self.arcs[arc_index].head_var.index();
                if head == target {
                    return true;
                }
                metronome_assert_moderate!(!self.bf_can_be_skipped[head]);
                self.bf_can_be_skipped[head] = true;
                self.tmp_vector.push(head);
            }
        }
        false
    }

    /// Reconstructs the positive cycle closed by `first_arc` by walking the parent arcs, and
    /// gathers its reason. Optional cycle members contribute their ignore literal to the
    /// returned must-be-all-true set instead of making the cycle an outright conflict.
    fn analyze_positive_cycle(
        &self,
        integer_trail: &IntegerTrail,
        first_arc: ArcIndex,
    ) -> (Vec<Literal>, Vec<Literal>, Vec<IntegerLiteral>) {
        let mut must_be_all_true = Vec::new();
        let mut literal_reason = Vec::new();
        let mut integer_reason = Vec::new();

        // The maximum cycle length on the graph bounds the walk; going past it means first_arc
        // is not on a parent-arc cycle, which must never happen.
        let num_nodes = self.impacted_arcs.len();
        let first_arc_head = self.arcs[first_arc].head_var;
        let mut arc_index = first_arc;
        let mut arcs_on_cycle = Vec::new();
        loop {
            metronome_assert_simple!(
                arcs_on_cycle.len() <= num_nodes,
                "cycle reconstruction does not terminate"
            );
            arcs_on_cycle.push(arc_index);
            let tail_var = self.arcs[arc_index].tail_var;
            if tail_var == first_arc_head {
                break;
            }
            arc_index = self.bf_parent_arc_of[tail_var.index()]
                .expect("a cycle member must have a parent arc");
        }

        let mut sum: i64 = 0;
        for &cycle_arc in &arcs_on_cycle {
            let arc = &self.arcs[cycle_arc];
            sum += arc_offset_of(integer_trail, arc);
            if let Some(offset_variable) = arc.offset_var {
                integer_reason.push(integer_trail.lower_bound_as_literal(offset_variable));
            }
            for &literal in &arc.presence_literals {
                literal_reason.push(!literal);
            }

            // Propagating through a not-yet-present optional variable means the presences on
            // the cycle stand or fall together; the members must then all be absent.
            if integer_trail.is_optional(arc.head_var) {
                must_be_all_true.push(
                    integer_trail
                        .ignored_literal(arc.head_var)
                        .expect("optional variables carry an ignore literal"),
                );
            }
        }
        metronome_assert_simple!(sum > 0, "only positive cycles are reconstructed");

        (must_be_all_true, literal_reason, integer_reason)
    }

    /// For each modified variable, scans the pending arcs it participates in: an arc with a
    /// single undecided presence literal which can no longer fit between its tail and head
    /// forces that literal to false.
    fn propagate_optional_arcs(&mut self, ctx: &mut PropagationContextMut) {
        for i in 0..self.modified_vars.num_positions() {
            let var = self.modified_vars.position(i);
            if var >= self.impacted_potential_arcs.len() {
                continue;
            }
            let var = IntegerVariable::from_index(var);

            // The same arc can be checked up to three times, once for each of its views.
            for j in 0..self.impacted_potential_arcs[var].len() {
                let arc_index = self.impacted_potential_arcs[var][j];
                let push = {
                    let arc = &self.potential_arcs[arc_index];
                    let mut num_not_true = 0;
                    let mut to_propagate = None;
                    for &literal in &arc.presence_literals {
                        if !ctx.boolean_trail.is_literal_assigned_true(literal) {
                            num_not_true += 1;
                            to_propagate = Some(literal);
                        }
                    }
                    match to_propagate {
                        Some(to_propagate)
                            if num_not_true == 1
                                && !ctx.boolean_trail.is_literal_assigned_false(to_propagate) =>
                        {
                            // The arc tail can be different from var here.
                            let tail_lb = ctx.integer_trail.lower_bound(arc.tail_var);
                            let head_ub = ctx.integer_trail.upper_bound(arc.head_var);
                            if tail_lb + arc_offset_of(ctx.integer_trail, arc) > head_ub {
                                let mut integer_reason = vec![
                                    ctx.integer_trail.lower_bound_as_literal(arc.tail_var),
                                    ctx.integer_trail.upper_bound_as_literal(arc.head_var),
                                ];
                                if let Some(offset_variable) = arc.offset_var {
                                    integer_reason.push(
                                        ctx.integer_trail.lower_bound_as_literal(offset_variable),
                                    );
                                }
                                let literal_reason = arc
                                    .presence_literals
                                    .iter()
                                    .filter(|&&literal| literal != to_propagate)
                                    .map(|&literal| !literal)
                                    .collect::<Vec<_>>();
                                Some((
                                    !to_propagate,
                                    Reason::new(literal_reason, integer_reason),
                                ))
                            } else {
                                None
                            }
                        }
                        _ => None,
                    }
                };
                if let Some((literal, reason)) = push {
                    self.num_enforcement_pushes += 1;
                    ctx.enqueue_literal(literal, reason);
                }
            }
        }
    }
}

fn arc_offset_of(integer_trail: &IntegerTrail, arc: &ArcInfo) -> i64 {
    arc.offset
        + arc
            .offset_var
            .map_or(0, |offset_variable| integer_trail.lower_bound(offset_variable))
}
