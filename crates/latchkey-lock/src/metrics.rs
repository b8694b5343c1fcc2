// Metrics for the lock protocol
// Recorded through the `metrics` facade; calls are no-ops until a recorder is installed

use std::time::Duration;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};

pub const ACQUIRE_TOTAL: &str = "latchkey_acquire_total";
pub const RELEASE_TOTAL: &str = "latchkey_release_total";
pub const ACQUIRE_WAIT_SECONDS: &str = "latchkey_acquire_wait_seconds";

/// Result of an acquisition, used as the `outcome` label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    /// Single attempt lost to another holder (or a store failure)
    Contended,
    /// Bounded wait ran out of budget
    TimedOut,
    /// Rejected before reaching the store (zero lease)
    Rejected,
}

impl AcquireOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AcquireOutcome::Acquired => "acquired",
            AcquireOutcome::Contended => "contended",
            AcquireOutcome::TimedOut => "timed_out",
            AcquireOutcome::Rejected => "rejected",
        }
    }
}

/// Register metric descriptions. Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        ACQUIRE_TOTAL,
        "Lock acquisitions by outcome (acquired, contended, timed_out, rejected)"
    );
    describe_counter!(
        RELEASE_TOTAL,
        "Lock releases by outcome (released, not_owner)"
    );
    describe_histogram!(
        ACQUIRE_WAIT_SECONDS,
        Unit::Seconds,
        "Time spent inside bounded-wait acquire calls"
    );
}

pub(crate) fn record_acquire(outcome: AcquireOutcome) {
    counter!(ACQUIRE_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

pub(crate) fn record_acquire_wait(waited: Duration) {
    histogram!(ACQUIRE_WAIT_SECONDS).record(waited.as_secs_f64());
}

pub(crate) fn record_release(released: bool) {
    let outcome = if released { "released" } else { "not_owner" };
    counter!(RELEASE_TOTAL, "outcome" => outcome).increment(1);
}
