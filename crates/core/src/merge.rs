//! Stable two-pointer merge of pre-sorted event sequences.

use crate::event::NormalizedEvent;
use std::cmp::Ordering;

/// Merge two sequences that are each already sorted by `key`.
///
/// A missing key sorts after every present key. On ties, and between two
/// missing keys, elements of `left` come first. When either side is empty
/// the other is returned as-is.
pub fn merge_by_time<T, K>(left: Vec<T>, right: Vec<T>, key: K) -> Vec<T>
where
    K: Fn(&T) -> Option<f64>,
{
    if right.is_empty() {
        return left;
    }
    if left.is_empty() {
        return right;
    }

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare_keys(key(l), key(r)) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        out.extend(next);
    }

    out
}

/// Splice hook events into the primary stream by time.
pub fn merge_events(
    primary: Vec<NormalizedEvent>,
    hooks: Vec<NormalizedEvent>,
) -> Vec<NormalizedEvent> {
    merge_by_time(primary, hooks, NormalizedEvent::ordering_key)
}

fn compare_keys(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(l), Some(r)) => l.total_cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
