use crate::basic_types::KeyedVec;
use crate::basic_types::Reason;
use crate::basic_types::Trail;
use crate::engine::variables::Literal;
use crate::engine::variables::PropositionalVariable;
use crate::metronome_asserts::metronome_assert_moderate;

/// The Boolean side of the solver state: an assignment over [`PropositionalVariable`]s and the
/// chronological trail of assigned [`Literal`]s.
///
/// Propagators consume the trail by index (see
/// [`PrecedencesPropagator`](crate::propagators::precedences::PrecedencesPropagator) and its
/// `propagation_trail_index` high-water mark) which is why entries are exposed positionally
/// rather than only through iteration.
#[derive(Clone, Debug, Default)]
pub struct BooleanTrail {
    assignment_info: KeyedVec<PropositionalVariable, AssignmentInfo>,
    trail: Trail<Literal>,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum AssignmentInfo {
    #[default]
    Unassigned,
    Assigned {
        truth_value: bool,
        decision_level: usize,
        reason: Option<Reason>,
    },
}

impl BooleanTrail {
    pub fn grow(&mut self) -> PropositionalVariable {
        self.assignment_info.push(AssignmentInfo::Unassigned)
    }

    /// Creates a fresh propositional variable and returns its positive literal.
    pub fn new_literal(&mut self) -> Literal {
        Literal::new(self.grow(), true)
    }

    pub fn num_propositional_variables(&self) -> u32 {
        self.assignment_info.len() as u32
    }

    pub fn increase_decision_level(&mut self) {
        self.trail.new_checkpoint()
    }

    pub fn get_decision_level(&self) -> usize {
        self.trail.get_checkpoint()
    }

    pub fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }

    pub fn get_trail_entry(&self, index: usize) -> Literal {
        self.trail[index]
    }

    /// The number of trail entries up to (and including) the given decision level.
    pub fn num_trail_entries_at_level(&self, level: usize) -> usize {
        self.trail.num_entries_at_checkpoint(level)
    }

    pub fn is_variable_assigned(&self, variable: PropositionalVariable) -> bool {
        self.assignment_info[variable] != AssignmentInfo::Unassigned
    }

    pub fn is_literal_assigned(&self, literal: Literal) -> bool {
        self.is_variable_assigned(literal.get_propositional_variable())
    }

    pub fn is_literal_assigned_true(&self, literal: Literal) -> bool {
        match self.assignment_info[literal.get_propositional_variable()] {
            AssignmentInfo::Assigned { truth_value, .. } => truth_value == literal.is_positive(),
            AssignmentInfo::Unassigned => false,
        }
    }

    pub fn is_literal_assigned_false(&self, literal: Literal) -> bool {
        self.is_literal_assigned(literal) && !self.is_literal_assigned_true(literal)
    }

    pub fn get_literal_assignment_level(&self, literal: Literal) -> usize {
        match self.assignment_info[literal.get_propositional_variable()] {
            AssignmentInfo::Assigned { decision_level, .. } => decision_level,
            AssignmentInfo::Unassigned => {
                panic!("unassigned literals do not have an assignment level")
            }
        }
    }

    /// Assigns the literal to true as a search decision.
    pub fn enqueue_decision(&mut self, literal: Literal) {
        self.make_assignment(literal, None)
    }

    /// Assigns the literal to true as a consequence of propagation with the given reason.
    pub fn enqueue_propagated(&mut self, literal: Literal, reason: Reason) {
        self.make_assignment(literal, Some(reason))
    }

    fn make_assignment(&mut self, literal: Literal, reason: Option<Reason>) {
        metronome_assert_moderate!(
            !self.is_literal_assigned(literal),
            "cannot assign an already assigned literal"
        );
        let decision_level = self.get_decision_level();
        self.assignment_info[literal.get_propositional_variable()] = AssignmentInfo::Assigned {
            truth_value: literal.is_positive(),
            decision_level,
            reason,
        };
        self.trail.push(literal);
    }

    /// The propagation reason of a literal, if it was propagated rather than decided.
    pub fn get_reason(&self, literal: Literal) -> Option<&Reason> {
        match &self.assignment_info[literal.get_propositional_variable()] {
            AssignmentInfo::Assigned { reason, .. } => reason.as_ref(),
            AssignmentInfo::Unassigned => None,
        }
    }

    /// Backtracks to the given decision level; returns the literals which were unassigned, in
    /// reverse trail order.
    pub fn synchronise(&mut self, new_decision_level: usize) -> Vec<Literal> {
        let unassigned = self.trail.synchronise(new_decision_level).collect::<Vec<_>>();
        for &literal in &unassigned {
            self.assignment_info[literal.get_propositional_variable()] =
                AssignmentInfo::Unassigned;
        }
        unassigned
    }
}
