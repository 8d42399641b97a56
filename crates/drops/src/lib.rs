//! Drop-reaction coordinator: turns one observed drop announcement into a
//! staggered burst of tagged reactions, one per bound account slot.

pub mod coordinator;

pub use coordinator::ReactionCoordinator;
