//! Scheduled sessions between a learner and an instructor.
//!
//! An `Engagement` is hydrated from a `/api/list_lectures` record and can
//! only move forward, from `Requested` to `Confirmed`. Confirmation is a
//! local state change; the backend exposes no confirmation route.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ApiError;
use crate::types::EngagementRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementState {
    Requested,
    Confirmed,
}

impl FromStr for EngagementState {
    type Err = ApiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("REQUESTED") {
            Ok(EngagementState::Requested)
        } else if raw.eq_ignore_ascii_case("CONFIRMED") {
            Ok(EngagementState::Confirmed)
        } else {
            Err(ApiError::MalformedPayload(format!("unknown engagement state {raw:?}")))
        }
    }
}

impl fmt::Display for EngagementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngagementState::Requested => f.write_str("REQUESTED"),
            EngagementState::Confirmed => f.write_str("CONFIRMED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engagement {
    id: i64,
    instructor_name: String,
    learner_name: String,
    scheduled_at: DateTime<Utc>,
    state: EngagementState,
}

impl Engagement {
    pub fn from_record(record: EngagementRecord) -> Result<Self, ApiError> {
        let state = record.state.parse()?;
        let scheduled_at = parse_time(&record.time)?;
        Ok(Self {
            id: record.obj_id,
            instructor_name: record.tutor,
            learner_name: record.student,
            scheduled_at,
            state,
        })
    }

    /// Hydrate every record or none: the first bad record fails the batch.
    pub fn from_records(records: Vec<EngagementRecord>) -> Result<Vec<Self>, ApiError> {
        records.into_iter().map(Self::from_record).collect()
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn instructor_name(&self) -> &str {
        &self.instructor_name
    }

    pub fn learner_name(&self) -> &str {
        &self.learner_name
    }

    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    pub fn state(&self) -> EngagementState {
        self.state
    }

    /// Mark the engagement confirmed. Calling it again is a no-op.
    pub fn confirm(&mut self) {
        self.state = EngagementState::Confirmed;
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` (midnight UTC), or
/// integer epoch milliseconds.
fn parse_time(value: &serde_json::Value) -> Result<DateTime<Utc>, ApiError> {
    let malformed = || ApiError::MalformedPayload(format!("unrecognized engagement time {value}"));
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(malformed),
        serde_json::Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Ok(dt.and_utc());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .ok_or_else(malformed)
        }
        _ => Err(malformed()),
    }
}
