//! Wall-clock time as a narrow capability.

/// A source of seconds-since-epoch.
///
/// Before the board-support binary has completed time synchronization,
/// implementations are expected to read as (at or near) the Unix epoch
/// origin; [`crate::baseline_store::is_expired`] relies on that to force
/// baseline expiry until a real clock is available.
pub trait Clock {
    /// Current time, in seconds since the Unix epoch.
    fn now(&self) -> i64;
}
