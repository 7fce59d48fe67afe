//! Health check definitions.

/// Proof of a successful storage round-trip.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Alive;
