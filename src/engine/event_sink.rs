use enumset::EnumSet;
use enumset::EnumSetType;

use crate::basic_types::KeyedVec;
use crate::engine::variables::IntegerVariable;
use crate::metronome_asserts::metronome_assert_advanced;

/// The domain events which can occur on an [`IntegerVariable`] view. Since every view only
/// stores its lower bound, an upper-bound event on `v` is a lower-bound event on
/// `negation(v)`.
#[derive(EnumSetType, Debug)]
pub enum IntDomainEvent {
    LowerBound,
    UpperBound,
}

/// While bounds change on the integer trail, the changes are captured as events in the event
/// sink. The sink is drained to notify the subscribed propagators; duplicate events on the
/// same view are ignored.
#[derive(Default, Clone, Debug)]
pub struct EventSink {
    present: KeyedVec<IntegerVariable, EnumSet<IntDomainEvent>>,
    events: Vec<(IntDomainEvent, IntegerVariable)>,
}

impl EventSink {
    pub fn grow(&mut self) {
        let _ = self.present.push(EnumSet::new());
    }

    pub fn event_occurred(&mut self, event: IntDomainEvent, var: IntegerVariable) {
        let elem = &mut self.present[var];

        if elem.insert(event) {
            self.events.push((event, var));
        } else {
            metronome_assert_advanced!(self.events.iter().any(|p| p.0 == event && p.1 == var));
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (IntDomainEvent, IntegerVariable)> + '_ {
        self.events.drain(..).inspect(|&(event, var)| {
            let _ = self.present[var].remove(event);
        })
    }

    pub fn num_views(&self) -> usize {
        self.present.len()
    }
}
