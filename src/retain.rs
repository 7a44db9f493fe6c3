//! Count-keep and age-threshold retention rules.

use crate::classify::VersionDirectory;
use crate::config::{Retention, DISABLED};
use crate::gate::{ExecutionGate, Reason};
use chrono::{DateTime, Local};
use std::time::SystemTime;

/// Whole calendar-day boundaries crossed between `then` and `now`.
///
/// A file written at 23:59 is one day old at 00:01, while a file written 23
/// hours ago on the same date is zero days old. This is the original
/// counting behavior and differs from rounding a 24-hour duration.
pub fn elapsed_days(then: SystemTime, now: DateTime<Local>) -> i64 {
    let then: DateTime<Local> = then.into();
    now.date_naive()
        .signed_duration_since(then.date_naive())
        .num_days()
}

/// Directories at ordinal position `>= keep` in the established ordering.
///
/// A `keep` of [`DISABLED`] makes the rule inert. Ties are broken purely by
/// the ordering the classifier produced; there is no secondary criterion.
pub fn count_candidates<'a>(
    dirs: &'a [VersionDirectory],
    keep: i64,
) -> impl Iterator<Item = &'a VersionDirectory> {
    let skip = if keep < 0 { dirs.len() } else { keep as usize };
    dirs.iter().skip(skip)
}

/// Directories whose representative timestamp is more than `delay` whole
/// days old. A `delay` of [`DISABLED`] makes the rule inert.
pub fn age_candidates<'a>(
    dirs: &'a [VersionDirectory],
    delay: i64,
    now: DateTime<Local>,
) -> impl Iterator<Item = &'a VersionDirectory> {
    dirs.iter()
        .filter(move |dir| delay != DISABLED && elapsed_days(dir.modified, now) > delay)
}

/// Run both rules over the same ordered subset and route every candidate
/// through the gate.
///
/// The rules are independent: each consumes the classifier's original
/// ordering, never the output of the other. A directory flagged by both is
/// submitted twice and deleted once; the second deletion finds the path
/// already gone, which the gate does not treat as a failure.
pub fn apply(
    dirs: &[VersionDirectory],
    retention: Retention,
    now: DateTime<Local>,
    gate: &mut ExecutionGate,
) {
    for dir in count_candidates(dirs, retention.keep_count) {
        gate.submit(&dir.path, Reason::CountExpired);
    }

    for dir in age_candidates(dirs, retention.delay_days, now) {
        gate.submit(&dir.path, Reason::AgeExpired);
    }
}
