//! Pair state machine
//!
//! Phases and events are explicit, finite and deterministic; the
//! surrounding [`PairState`] carries the timing a controller needs.

pub mod events;
pub mod machine;
pub mod pair;

pub use events::PairEvent;
pub use machine::PairPhase;
pub use pair::PairState;
