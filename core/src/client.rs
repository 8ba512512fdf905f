//! Stateless HTTP request builder and response parser for the tutoring API.
//!
//! # Design
//! `TutoringClient` holds only an `EndpointConfig` and carries no mutable
//! state between calls. Each backend route is split into a `build_*` method
//! that produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. `Dispatcher` runs the two halves around a `Transport`;
//! hosts that own their I/O can call them directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::account::{AccountKind, Instructor, InstructorRegistration, LearnerRegistration};
use crate::endpoint::EndpointConfig;
use crate::engagement::Engagement;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    EngagementRecord, EngagementRequest, FindInstructorsResponse, InstructorFilter, LoginRequest,
    LoginResponse, ProfileRecord, UsernameQuery,
};

pub const ROUTE_ROOT: &str = "";
pub const ROUTE_CONFIG: &str = "/api";
pub const ROUTE_REGISTER_LEARNER: &str = "/api/register_student";
pub const ROUTE_REGISTER_INSTRUCTOR: &str = "/api/register_tutor";
pub const ROUTE_LOGIN: &str = "/api/login";
pub const ROUTE_USER_TYPE: &str = "/api/get_user_type";
pub const ROUTE_USER_PROFILE: &str = "/api/get_user_profile";
pub const ROUTE_FIND_INSTRUCTORS: &str = "/api/find_tutors";
pub const ROUTE_LIST_ENGAGEMENTS: &str = "/api/list_lectures";
pub const ROUTE_REQUEST_ENGAGEMENT: &str = "/api/request_lecture";

/// Whose type or profile a lookup is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal<'a> {
    /// The caller, identified by its bearer token.
    Token(&'a str),
    /// Any user, identified by username in the body.
    Username(&'a str),
}

/// Synchronous, stateless client for the tutoring API.
#[derive(Debug, Clone)]
pub struct TutoringClient {
    config: EndpointConfig,
}

impl TutoringClient {
    pub fn new(config: EndpointConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Build a request for `route`. An empty bearer token or body is treated
    /// as absent.
    pub fn build_request(
        &self,
        route: &str,
        method: HttpMethod,
        bearer: Option<&str>,
        body: Option<String>,
    ) -> HttpRequest {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(token) = bearer.filter(|t| !t.is_empty()) {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        let body = body.filter(|b| !b.is_empty());
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path: self.config.target(route),
            headers,
            body,
        }
    }

    fn build_json<T: Serialize>(
        &self,
        route: &str,
        method: HttpMethod,
        bearer: Option<&str>,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::InvalidRequestBody(e.to_string()))?;
        Ok(self.build_request(route, method, bearer, Some(body)))
    }

    pub fn build_ping(&self) -> HttpRequest {
        self.build_request(ROUTE_ROOT, HttpMethod::Get, None, None)
    }

    pub fn build_server_configuration(&self) -> HttpRequest {
        self.build_request(ROUTE_CONFIG, HttpMethod::Get, None, None)
    }

    pub fn build_register_learner(
        &self,
        input: &LearnerRegistration,
    ) -> Result<HttpRequest, ApiError> {
        self.build_json(ROUTE_REGISTER_LEARNER, HttpMethod::Put, None, &input.to_wire())
    }

    pub fn build_register_instructor(
        &self,
        input: &InstructorRegistration,
    ) -> Result<HttpRequest, ApiError> {
        self.build_json(ROUTE_REGISTER_INSTRUCTOR, HttpMethod::Post, None, &input.to_wire())
    }

    pub fn build_login(&self, username: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let input = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.build_json(ROUTE_LOGIN, HttpMethod::Post, None, &input)
    }

    pub fn build_user_type(&self, principal: Principal<'_>) -> Result<HttpRequest, ApiError> {
        self.build_lookup(ROUTE_USER_TYPE, principal)
    }

    pub fn build_user_profile(&self, principal: Principal<'_>) -> Result<HttpRequest, ApiError> {
        self.build_lookup(ROUTE_USER_PROFILE, principal)
    }

    fn build_lookup(&self, route: &str, principal: Principal<'_>) -> Result<HttpRequest, ApiError> {
        match principal {
            Principal::Token(token) => Ok(self.build_request(route, HttpMethod::Post, Some(token), None)),
            Principal::Username(username) => {
                let input = UsernameQuery {
                    username: username.to_string(),
                };
                self.build_json(route, HttpMethod::Post, None, &input)
            }
        }
    }

    /// Fails with `InvalidFilter` before building anything if both filters
    /// are absent.
    pub fn build_find_instructors(
        &self,
        bearer: Option<&str>,
        filter: &InstructorFilter,
    ) -> Result<HttpRequest, ApiError> {
        if filter.is_empty() {
            return Err(ApiError::InvalidFilter);
        }
        self.build_json(ROUTE_FIND_INSTRUCTORS, HttpMethod::Post, bearer, filter)
    }

    pub fn build_list_engagements(&self, bearer: Option<&str>) -> HttpRequest {
        self.build_request(ROUTE_LIST_ENGAGEMENTS, HttpMethod::Get, bearer, None)
    }

    pub fn build_request_engagement(
        &self,
        bearer: Option<&str>,
        instructor_username: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<HttpRequest, ApiError> {
        let input = EngagementRequest {
            tutor_username: instructor_username.to_string(),
            scheduled: scheduled_at.timestamp_millis(),
        };
        self.build_json(ROUTE_REQUEST_ENGAGEMENT, HttpMethod::Put, bearer, &input)
    }

    /// Accept any 2xx response whose body is irrelevant.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(response).map(|_| ())
    }

    pub fn parse_server_configuration(
        &self,
        response: HttpResponse,
    ) -> Result<BTreeMap<String, serde_json::Value>, ApiError> {
        let response = check_status(response)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Extract the access token from a login response.
    pub fn parse_login(&self, response: HttpResponse) -> Result<String, ApiError> {
        let response = check_status(response)?;
        let login: LoginResponse = serde_json::from_str(&response.body)?;
        Ok(login.access_token)
    }

    pub fn parse_user_type(&self, response: HttpResponse) -> Result<AccountKind, ApiError> {
        check_status(response)?.body.parse()
    }

    pub fn parse_user_profile(&self, response: HttpResponse) -> Result<ProfileRecord, ApiError> {
        let response = check_status(response)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Search results are other users and carry no session token.
    pub fn parse_find_instructors(&self, response: HttpResponse) -> Result<Vec<Instructor>, ApiError> {
        let response = check_status(response)?;
        let found: FindInstructorsResponse = serde_json::from_str(&response.body)?;
        Ok(found.response.into_iter().map(Instructor::from_record).collect())
    }

    pub fn parse_list_engagements(&self, response: HttpResponse) -> Result<Vec<Engagement>, ApiError> {
        let response = check_status(response)?;
        let records: Vec<EngagementRecord> = serde_json::from_str(&response.body)?;
        Engagement::from_records(records)
    }
}

/// Pass 2xx responses through; map everything else to its `ApiError`.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    tracing::warn!(status = response.status, "backend rejected request");
    Err(ApiError::from_status(response.status, response.body))
}
