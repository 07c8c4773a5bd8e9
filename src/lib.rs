//! # Metronome
//! Metronome is the precedence reasoning and search construction core of a CP-SAT solver.
//!
//! The crate provides two tightly coupled subsystems:
//! - An incremental difference-constraint propagator over relations of the form
//!   `tail + offset <= head`, optionally with a variable offset and optionally enforced by a
//!   conjunction of Boolean literals. Lower bounds are maintained by a Bellman-Ford propagation
//!   with Tarjan subtree disassembly for positive-cycle detection, and conflicts are explained
//!   with reasons suitable for clause learning (see [`propagators::precedences`]).
//! - A composable branching framework which turns user-declared decision strategies into
//!   [`branching::Brancher`] implementations, together with the enumeration of a diverse
//!   portfolio of solver parameter variants for multi-worker search (see [`parameters`]).
//!
//! The solver state the propagator runs against (the Boolean and integer trails) lives in
//! [`engine`]; the thin adapters over a model description used by the branching layer live in
//! [`model`].
pub mod basic_types;
pub mod branching;
pub mod engine;
pub mod model;
pub mod parameters;
pub mod propagators;

pub(crate) mod metronome_asserts;
