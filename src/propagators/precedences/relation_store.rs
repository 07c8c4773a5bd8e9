use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;

use crate::basic_types::HashMap;
use crate::basic_types::HashSet;
use crate::engine::variables::IntegerVariable;
use crate::engine::IntegerTrail;

/// For a variable `var`, the subset of a queried variable list which is known to lie before
/// `var`, together with the strongest offsets. `indices` point into the queried list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullPrecedence {
    pub var: IntegerVariable,
    pub indices: Vec<usize>,
    pub offsets: Vec<i64>,
}

/// A store of unconditional level-zero precedence relations `tail + offset <= head`.
///
/// The store accumulates relations while the model is loaded, and on the first query builds a
/// topological order of the resulting graph together with a transitive map of the strongest
/// offset between variable pairs. Relations are stored on both orientations: `a + k <= b` also
/// induces `~b + k <= ~a`.
///
/// Only non-negative offsets between distinct variables are accepted, which keeps the graph a
/// DAG candidate; if a cycle is present anyway the store degrades to a no-op on queries.
#[derive(Debug, Default)]
pub struct PrecedenceRelations {
    arcs: Vec<(IntegerVariable, IntegerVariable, i64)>,
    num_nodes: usize,

    is_built: bool,
    is_dag: bool,
    topological_order: Vec<IntegerVariable>,
    /// Outgoing arcs of each view, available after [`PrecedenceRelations::build`].
    outgoing: Vec<Vec<(IntegerVariable, i64)>>,
    /// `(a, b) -> k` such that `a + k <= b` holds at level zero, with `k` the strongest known
    /// offset.
    all_relations: HashMap<(IntegerVariable, IntegerVariable), i64>,
}

impl PrecedenceRelations {
    /// Records `tail + offset <= head` unless it is trivially implied by the current level-zero
    /// bounds, relates a variable to itself, or has a negative offset. Calls after the first
    /// query (see [`PrecedenceRelations::build`]) are ignored.
    pub fn add(
        &mut self,
        integer_trail: &IntegerTrail,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i64,
    ) {
        if self.is_built {
            return;
        }

        if integer_trail.upper_bound(tail) + offset <= integer_trail.lower_bound(head) {
            return;
        }
        if tail.positive_variable() == head.positive_variable() {
            return;
        }

        // Negative offsets could close cycles; they are rejected to keep the graph a DAG.
        if offset < 0 {
            return;
        }

        self.arcs.push((tail, head, offset));
        self.arcs.push((head.negation(), tail.negation(), offset));
        let max_index = tail.index().max(tail.negation().index()).max(
            head.index().max(head.negation().index()),
        );
        self.num_nodes = self.num_nodes.max(max_index + 1);
    }

    /// Freezes the store: computes a topological order and, if the graph is a DAG, a bounded
    /// single-pass relaxation of the strongest offsets along it. Idempotent.
    ///
    /// The relaxation is capped at 10^6 elementary operations; past the cap the relation map is
    /// a subset of the true transitive precedences.
    pub fn build(&mut self) {
        if self.is_built {
            return;
        }
        self.is_built = true;

        let mut graph = DiGraph::<(), ()>::new();
        for _ in 0..self.num_nodes {
            let _ = graph.add_node(());
        }
        for &(tail, head, _) in &self.arcs {
            let _ = graph.add_edge(
                NodeIndex::new(tail.index()),
                NodeIndex::new(head.index()),
                (),
            );
        }

        self.topological_order = match toposort(&graph, None) {
            Ok(order) => order
                .into_iter()
                .map(|node| IntegerVariable::from_index(node.index()))
                .collect(),
            Err(_) => {
                self.is_dag = false;
                return;
            }
        };
        self.is_dag = true;

        self.outgoing = vec![Vec::new(); self.num_nodes];
        for &(tail, head, offset) in &self.arcs {
            self.outgoing[tail.index()].push((head, offset));
        }

        const WORK_LIMIT: u64 = 1_000_000;
        let mut work: u64 = 0;
        let mut before: Vec<Vec<IntegerVariable>> = vec![Vec::new(); self.num_nodes];

        fn record(
            all_relations: &mut HashMap<(IntegerVariable, IntegerVariable), i64>,
            before: &mut [Vec<IntegerVariable>],
            a: IntegerVariable,
            b: IntegerVariable,
            offset: i64,
        ) {
            match all_relations.entry((a, b)) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let _ = entry.insert(offset);
                    before[b.index()].push(a);
                }
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    let strongest = (*entry.get()).max(offset);
                    let _ = entry.insert(strongest);
                }
            }
        }

        let all_relations = &mut self.all_relations;
        'relaxation: for order_index in 0..self.topological_order.len() {
            let tail_var = self.topological_order[order_index];
            work += 1;
            if work > WORK_LIMIT {
                break;
            }
            for arc_index in 0..self.outgoing[tail_var.index()].len() {
                let (head_var, arc_offset) = self.outgoing[tail_var.index()][arc_index];

                work += 1;
                if work > WORK_LIMIT {
                    break 'relaxation;
                }
                record(all_relations, &mut before, tail_var, head_var, arc_offset);
                record(
                    all_relations,
                    &mut before,
                    head_var.negation(),
                    tail_var.negation(),
                    -arc_offset,
                );

                for before_index in 0..before[tail_var.index()].len() {
                    let before_var = before[tail_var.index()][before_index];
                    work += 1;
                    if work > WORK_LIMIT {
                        break 'relaxation;
                    }
                    let offset = all_relations[&(before_var, tail_var)] + arc_offset;
                    record(all_relations, &mut before, before_var, head_var, offset);
                    record(
                        all_relations,
                        &mut before,
                        head_var.negation(),
                        before_var.negation(),
                        -offset,
                    );
                }
            }
        }

        log::debug!(
            "precedence relations: work={} relations={}",
            work,
            self.all_relations.len()
        );
    }

    /// The strongest known level-zero offset such that `a + offset <= b`, if any.
    pub fn offset_between(&self, a: IntegerVariable, b: IntegerVariable) -> Option<i64> {
        self.all_relations.get(&(a, b)).copied()
    }

    /// Enumerates, for each variable in topological order, the subset of `vars` proven to lie
    /// before it with their strongest offsets.
    ///
    /// A heuristic pruning is applied: an entry for `head` is only emitted when its predecessor
    /// set carries information not already implied by the predecessors of some tail leading
    /// into it, and single-predecessor entries are suppressed. On a non-DAG graph the output
    /// is empty.
    pub fn compute_full_precedences(&mut self, vars: &[IntegerVariable]) -> Vec<FullPrecedence> {
        if !self.is_built {
            self.build();
        }
        if !self.is_dag {
            return Vec::new();
        }

        let mut output = Vec::new();
        let mut is_interesting: HashSet<IntegerVariable> = HashSet::default();
        let to_consider: HashSet<IntegerVariable> = vars.iter().copied().collect();
        let mut vars_before_with_offset: HashMap<
            IntegerVariable,
            HashMap<IntegerVariable, i64>,
        > = HashMap::default();

        for order_index in 0..self.topological_order.len() {
            let tail_var = self.topological_order[order_index];
            if !to_consider.contains(&tail_var) && !vars_before_with_offset.contains_key(&tail_var)
            {
                continue;
            }

            // The map for tail_var is final because of the topological ordering; a copy keeps
            // it available while the entries of the heads are updated.
            let tail_map = vars_before_with_offset
                .get(&tail_var)
                .cloned()
                .unwrap_or_default();

            for arc_index in 0..self.outgoing[tail_var.index()].len() {
                let (head_var, arc_offset) = self.outgoing[tail_var.index()][arc_index];

                if tail_map.is_empty() && !to_consider.contains(&tail_var) {
                    continue;
                }

                let to_update = vars_before_with_offset.entry(head_var).or_default();
                for (&var_before, &offset) in &tail_map {
                    let entry = to_update.entry(var_before).or_insert(arc_offset + offset);
                    *entry = (*entry).max(arc_offset + offset);
                }
                if to_consider.contains(&tail_var) {
                    let entry = to_update.entry(tail_var).or_insert(arc_offset);
                    *entry = (*entry).max(arc_offset);
                }

                // If every predecessor of head is already a predecessor of tail (plus tail
                // itself), listing head adds nothing over the entry for tail.
                if to_update.len() > tail_map.len() + 1 {
                    let _ = is_interesting.insert(head_var);
                } else {
                    let _ = is_interesting.remove(&head_var);
                }
            }

            if !is_interesting.contains(&tail_var) {
                continue;
            }
            if tail_map.len() == 1 {
                continue;
            }

            let mut data = FullPrecedence {
                var: tail_var,
                indices: Vec::new(),
                offsets: Vec::new(),
            };
            for (i, var) in vars.iter().enumerate() {
                if let Some(&offset) = tail_map.get(var) {
                    data.indices.push(i);
                    data.offsets.push(offset);
                }
            }
            output.push(data);
        }

        output
    }
}
