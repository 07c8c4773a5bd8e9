mod boolean_trail;
mod event_sink;
mod integer_trail;
mod propagation_context;
pub mod termination;
pub mod variables;

pub use boolean_trail::BooleanTrail;
pub use event_sink::EventSink;
pub use event_sink::IntDomainEvent;
pub use integer_trail::EmptyDomain;
pub use integer_trail::IntegerTrail;
pub use propagation_context::PropagationContext;
pub use propagation_context::PropagationContextMut;
