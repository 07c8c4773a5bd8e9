use crate::basic_types::KeyedVec;
use crate::basic_types::Reason;
use crate::basic_types::Trail;
use crate::engine::event_sink::EventSink;
use crate::engine::event_sink::IntDomainEvent;
use crate::engine::variables::IntegerLiteral;
use crate::engine::variables::IntegerVariable;
use crate::engine::variables::Literal;
use crate::engine::BooleanTrail;
use crate::metronome_asserts::metronome_assert_moderate;
use crate::metronome_asserts::metronome_assert_simple;

/// Raised when tightening a bound would leave a variable with an empty domain.
#[derive(Clone, Copy, Debug)]
pub struct EmptyDomain;

/// Bound storage for integer variables, with a backtrackable trail of bound changes and their
/// propagation reasons.
///
/// Every variable materialises two views (see [`IntegerVariable`]): only lower bounds are
/// stored, and `upper_bound(v)` is defined as `-lower_bound(negation(v))`. Optional variables
/// carry an "ignore" literal; while that literal is unassigned the variable is live, and once
/// it is true the variable is absent from the constraints that reference it.
#[derive(Clone, Debug, Default)]
pub struct IntegerTrail {
    /// Current lower bound of each view.
    bounds: KeyedVec<IntegerVariable, i64>,
    /// Lower bound of each view at decision level zero.
    root_bounds: KeyedVec<IntegerVariable, i64>,
    trail: Trail<IntegerTrailEntry>,
    ignored_literals: KeyedVec<IntegerVariable, Option<Literal>>,
    events: EventSink,
}

#[derive(Clone, Debug)]
struct IntegerTrailEntry {
    var: IntegerVariable,
    old_bound: i64,
    new_bound: i64,
    reason: Option<Reason>,
}

impl IntegerTrail {
    /// Creates a new integer variable with the given initial bounds and returns its positive
    /// view.
    pub fn grow(&mut self, lower_bound: i64, upper_bound: i64) -> IntegerVariable {
        metronome_assert_simple!(lower_bound <= upper_bound, "cannot create an empty domain");

        let var = self.bounds.push(lower_bound);
        let _ = self.bounds.push(-upper_bound);
        let _ = self.root_bounds.push(lower_bound);
        let _ = self.root_bounds.push(-upper_bound);
        let _ = self.ignored_literals.push(None);
        let _ = self.ignored_literals.push(None);
        self.events.grow();
        self.events.grow();

        var
    }

    /// The number of views, i.e. twice the number of created variables.
    pub fn num_integer_variables(&self) -> usize {
        self.bounds.len()
    }

    pub fn lower_bound(&self, var: IntegerVariable) -> i64 {
        self.bounds[var]
    }

    pub fn upper_bound(&self, var: IntegerVariable) -> i64 {
        -self.bounds[var.negation()]
    }

    pub fn level_zero_lower_bound(&self, var: IntegerVariable) -> i64 {
        self.root_bounds[var]
    }

    pub fn level_zero_upper_bound(&self, var: IntegerVariable) -> i64 {
        -self.root_bounds[var.negation()]
    }

    pub fn is_fixed(&self, var: IntegerVariable) -> bool {
        self.lower_bound(var) == self.upper_bound(var)
    }

    pub fn lower_bound_as_literal(&self, var: IntegerVariable) -> IntegerLiteral {
        IntegerLiteral::greater_or_equal(var, self.lower_bound(var))
    }

    pub fn upper_bound_as_literal(&self, var: IntegerVariable) -> IntegerLiteral {
        IntegerLiteral::lower_or_equal(var, self.upper_bound(var))
    }

    /// Marks the variable as optional: when `ignored_literal` is true the variable is ignored.
    /// Both views share the literal.
    pub fn mark_optional(&mut self, var: IntegerVariable, ignored_literal: Literal) {
        self.ignored_literals[var] = Some(ignored_literal);
        self.ignored_literals[var.negation()] = Some(ignored_literal);
    }

    pub fn is_optional(&self, var: IntegerVariable) -> bool {
        self.ignored_literals[var].is_some()
    }

    pub fn ignored_literal(&self, var: IntegerVariable) -> Option<Literal> {
        self.ignored_literals[var]
    }

    pub fn is_currently_ignored(&self, var: IntegerVariable, boolean_trail: &BooleanTrail) -> bool {
        self.ignored_literals[var]
            .is_some_and(|literal| boolean_trail.is_literal_assigned_true(literal))
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

    /// Tightens the lower bound of the given view. A bound which does not improve on the
    /// current one is a no-op. Returns [`EmptyDomain`] when the new bound crosses the upper
    /// bound of the view.
    pub fn tighten_lower_bound(
        &mut self,
        var: IntegerVariable,
        new_bound: i64,
        reason: Option<Reason>,
    ) -> Result<(), EmptyDomain> {
        if new_bound <= self.bounds[var] {
            return self.verify_consistency(var);
        }

        let old_bound = self.bounds[var];
        self.trail.push(IntegerTrailEntry {
            var,
            old_bound,
            new_bound,
            reason,
        });
        self.bounds[var] = new_bound;
        if self.get_decision_level() == 0 {
            self.root_bounds[var] = new_bound;
        }

        self.events.event_occurred(IntDomainEvent::LowerBound, var);
        self.events
            .event_occurred(IntDomainEvent::UpperBound, var.negation());

        self.verify_consistency(var)
    }

    /// Applies the integer literal with a propagation reason.
    pub fn enqueue(&mut self, literal: IntegerLiteral, reason: Reason) -> Result<(), EmptyDomain> {
        self.tighten_lower_bound(literal.var, literal.bound, Some(reason))
    }

    fn verify_consistency(&self, var: IntegerVariable) -> Result<(), EmptyDomain> {
        if self.lower_bound(var) > self.upper_bound(var) {
            Err(EmptyDomain)
        } else {
            Ok(())
        }
    }

    /// Weakens a linear reason (a conjunction of bound literals with the given non-negative
    /// coefficients) by distributing `slack` over its literals. A literal `var >= b` may be
    /// relaxed down to the level-zero lower bound of `var`; each unit of relaxation on literal
    /// `i` consumes `coefficients[i]` units of slack.
    pub fn relax_linear_reason(
        &self,
        mut slack: i64,
        coefficients: &[i64],
        reason: &mut Vec<IntegerLiteral>,
    ) {
        metronome_assert_simple!(coefficients.len() == reason.len());
        metronome_assert_simple!(slack >= 0);

        for (literal, &coefficient) in reason.iter_mut().zip(coefficients) {
            metronome_assert_moderate!(coefficient > 0);
            if slack < coefficient {
                continue;
            }
            let max_relaxation = literal.bound - self.level_zero_lower_bound(literal.var);
            let relaxation = (slack / coefficient).min(max_relaxation);
            if relaxation > 0 {
                literal.bound -= relaxation;
                slack -= relaxation * coefficient;
            }
        }
    }

    /// Backtracks to the given decision level, restoring the bounds in reverse trail order.
    pub fn synchronise(&mut self, new_decision_level: usize) {
        // Collecting first keeps the borrow of the drained entries away from `bounds`.
        let undone = self
            .trail
            .synchronise(new_decision_level)
            .map(|entry| (entry.var, entry.old_bound))
            .collect::<Vec<_>>();
        for (var, old_bound) in undone {
            self.bounds[var] = old_bound;
        }
    }

    /// Drains the bound-change events which occurred since the last drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = (IntDomainEvent, IntegerVariable)> + '_ {
        self.events.drain()
    }

    /// The recorded reason of the earliest trail entry which establishes `literal`.
    pub fn get_reason(&self, literal: IntegerLiteral) -> Option<&Reason> {
        self.trail
            .iter()
            .find(|entry| entry.var == literal.var && entry.new_bound >= literal.bound)
            .and_then(|entry| entry.reason.as_ref())
    }
}
