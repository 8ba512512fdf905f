//! Wire DTOs for the tutoring API.
//!
//! # Design
//! These structs are the exact JSON shapes the backend speaks, field names
//! included. Domain values (`Account`, `Engagement`) are hydrated from them
//! in `account` and `engagement`; nothing outside this crate needs to see the
//! wire spelling. The mock-server crate defines its own copies and the
//! integration tests catch drift between the two.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `/api/register_student`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterLearner {
    pub username: String,
    pub name: String,
    pub password: String,
    pub locality: String,
}

/// Body of `/api/register_tutor`. The weekday key is camel-cased on this
/// route only; profiles spell it `allowed_weekdays`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterInstructor {
    pub username: String,
    pub name: String,
    pub password: String,
    pub locality: String,
    pub expertise: String,
    #[serde(rename = "allowedWeekdays")]
    pub allowed_weekdays: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Body used by the type and profile lookups when no bearer token is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

/// Body of `/api/find_tutors`. Absent filters are omitted from the JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstructorFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expertise: Option<String>,
}

impl InstructorFilter {
    /// Empty strings count as absent.
    pub fn new(locality: &str, expertise: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            locality: non_empty(locality),
            expertise: non_empty(expertise),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.locality.is_none() && self.expertise.is_none()
    }
}

/// A user profile or search-result credential record. Optional fields may
/// be missing or `null`; both read as empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    pub username: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub locality: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub expertise: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub allowed_weekdays: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindInstructorsResponse {
    pub response: Vec<ProfileRecord>,
}

/// One element of the `/api/list_lectures` array. `state` and `time` stay
/// raw here; `Engagement::from_record` validates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngagementRecord {
    pub obj_id: i64,
    pub tutor: String,
    pub student: String,
    pub state: String,
    pub time: serde_json::Value,
}

/// Body of `/api/request_lecture`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementRequest {
    pub tutor_username: String,
    /// Epoch milliseconds.
    pub scheduled: i64,
}
