//! Timestamp restoration for records written without one.
//!
//! A missing timestamp is interpolated linearly between the nearest
//! timestamped neighbors in merged order. With a single neighbor its value is
//! copied; with none, the source file's modification time is used.

use chrono::{DateTime, Duration, Utc};

use agentdesk_types::history::TimestampedMessage;

use super::merge::MergedMessage;

/// Fill in missing timestamps. Returns the messages and how many were restored.
pub fn restore_timestamps(messages: Vec<MergedMessage>) -> (Vec<TimestampedMessage>, usize) {
    let len = messages.len();

    let mut prev: Vec<Option<usize>> = vec![None; len];
    let mut last_known = None;
    for (i, m) in messages.iter().enumerate() {
        prev[i] = last_known;
        if m.timestamp.is_some() {
            last_known = Some(i);
        }
    }

    let mut next: Vec<Option<usize>> = vec![None; len];
    let mut next_known = None;
    for (i, m) in messages.iter().enumerate().rev() {
        next[i] = next_known;
        if m.timestamp.is_some() {
            next_known = Some(i);
        }
    }

    let known: Vec<Option<DateTime<Utc>>> = messages.iter().map(|m| m.timestamp).collect();
    let mut restored = 0;

    let out: Vec<TimestampedMessage> = messages
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            let (timestamp, was_restored) = match m.timestamp {
                Some(ts) => (ts, false),
                None => {
                    restored += 1;
                    let before = prev[i].and_then(|p| known[p].map(|t| (p, t)));
                    let after = next[i].and_then(|n| known[n].map(|t| (n, t)));
                    let ts = match (before, after) {
                        (Some((p, tp)), Some((n, tn))) => interpolate(tp, tn, i - p, n - p),
                        (Some((_, tp)), None) => tp,
                        (None, Some((_, tn))) => tn,
                        (None, None) => m.fallback,
                    };
                    (ts, true)
                }
            };
            TimestampedMessage {
                role: m.role,
                content: m.content,
                timestamp,
                timestamp_restored: was_restored,
                uuid: m.uuid,
            }
        })
        .collect();

    (out, restored)
}

/// `start + (end - start) * step / steps`, at millisecond precision.
fn interpolate(start: DateTime<Utc>, end: DateTime<Utc>, step: usize, steps: usize) -> DateTime<Utc> {
    if steps == 0 {
        return start;
    }
    let span_ms = (end - start).num_milliseconds();
    let offset = span_ms.saturating_mul(step as i64) / steps as i64;
    start + Duration::milliseconds(offset)
}
