//! Sortable identifier generation for durable records

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

// Highest millisecond component handed out so far; bumped when the clock
// has not advanced between calls, so keys stay strictly increasing within
// the process.
static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Generate a monotonic, lexicographically sortable record key.
///
/// Keys embed a zero-padded millisecond timestamp followed by a random
/// suffix, so the maximum key under string ordering is always the most
/// recently written record.
pub fn record_key() -> String {
    let now = Utc::now().timestamp_millis().max(0);
    let mut last = LAST_MILLIS.load(Ordering::SeqCst);
    let millis = loop {
        let next = now.max(last + 1);
        match LAST_MILLIS.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => break next,
            Err(actual) => last = actual,
        }
    };
    let suffix: u32 = rand::random();
    format!("{millis:013}-{suffix:08x}")
}
