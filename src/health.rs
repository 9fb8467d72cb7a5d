//! SLA/health evaluator
//!
//! The one piece of real computation in the gateway: given an event
//! timestamp and a threshold, judge whether the elapsed time stayed within
//! the allowed window. Pure apart from reading the clock; the clock is
//! injectable so tests are deterministic.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::model::HealthStatus;
use crate::{Error, Result};

/// Evaluate SLA compliance for an event created at `created_at` against a
/// threshold in seconds, relative to the current UTC time.
///
/// `created_at` is parsed as RFC 3339; a timestamp without an explicit
/// offset is interpreted as UTC. The boundary is inclusive: elapsed time
/// exactly equal to the threshold still meets the SLA. A future timestamp
/// (negative elapsed) also meets it.
///
/// # Errors
///
/// Returns [`Error::InvalidParams`] when `created_at` cannot be parsed.
/// The failure is scoped to this call only.
pub fn evaluate(created_at: &str, threshold_seconds: f64) -> Result<HealthStatus> {
    evaluate_at(created_at, threshold_seconds, Utc::now())
}

/// [`evaluate`] with an injected `now`, for deterministic evaluation.
pub fn evaluate_at(
    created_at: &str,
    threshold_seconds: f64,
    now: DateTime<Utc>,
) -> Result<HealthStatus> {
    let created = parse_timestamp(created_at)?;
    let elapsed = (now - created).num_milliseconds() as f64 / 1000.0;
    Ok(HealthStatus {
        sla_met: elapsed <= threshold_seconds,
        elapsed,
        threshold: threshold_seconds,
    })
}

/// Parse an absolute point in time; naive timestamps are read as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    value
        .parse::<NaiveDateTime>()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| Error::InvalidParams(format!("invalid createdAt timestamp '{value}': {e}")))
}
