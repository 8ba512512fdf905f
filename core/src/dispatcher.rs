//! Blocking dispatcher: build, execute through a `Transport`, classify.
//!
//! # Design
//! `Dispatcher` pairs a `TutoringClient` with a `Transport`. Every public
//! operation performs its exchanges one after another and returns only when
//! the last one completes or fails; no retries, no partial success. Local
//! preconditions (`InvalidFilter`) fail before anything is sent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::account::{
    Account, AccountKind, Instructor, InstructorRegistration, Learner, LearnerRegistration,
};
use crate::client::{Principal, TutoringClient};
use crate::endpoint::{self, EndpointConfig};
use crate::engagement::Engagement;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{InstructorFilter, ProfileRecord};

pub struct Dispatcher<T> {
    client: TutoringClient,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: EndpointConfig, transport: T) -> Self {
        Self {
            client: TutoringClient::new(config),
            transport,
        }
    }

    /// Capture the process-wide configuration installed by
    /// `endpoint::configure`.
    pub fn from_current(transport: T) -> Result<Self, ApiError> {
        let config = endpoint::current()?;
        Ok(Self::new((*config).clone(), transport))
    }

    pub fn client(&self) -> &TutoringClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one request to `route` and classify the response. Non-2xx
    /// statuses come back as their `ApiError`.
    pub fn send(
        &self,
        route: &str,
        method: HttpMethod,
        bearer: Option<&str>,
        json_body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.client.build_request(route, method, bearer, json_body);
        crate::client::check_status(self.execute(&request)?)
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(
            method = %request.method,
            route = route_of(&request.path, self.client.config()),
            authenticated = request.header("authorization").is_some(),
            "dispatching request"
        );
        self.transport.execute(request)
    }

    /// Liveness check against the backend root.
    pub fn ping(&self) -> Result<(), ApiError> {
        let request = self.client.build_ping();
        self.client.parse_empty(self.execute(&request)?)
    }

    pub fn server_configuration(&self) -> Result<BTreeMap<String, serde_json::Value>, ApiError> {
        let request = self.client.build_server_configuration();
        self.client.parse_server_configuration(self.execute(&request)?)
    }

    /// Register a learner. Does not log in; call `login` afterwards.
    pub fn register_learner(&self, input: &LearnerRegistration) -> Result<(), ApiError> {
        let request = self.client.build_register_learner(input)?;
        self.client.parse_empty(self.execute(&request)?)
    }

    /// Register an instructor. Does not log in; call `login` afterwards.
    pub fn register_instructor(&self, input: &InstructorRegistration) -> Result<(), ApiError> {
        let request = self.client.build_register_instructor(input)?;
        self.client.parse_empty(self.execute(&request)?)
    }

    /// Log in and hydrate the caller's own account, token attached.
    ///
    /// Three exchanges: login, type lookup, profile fetch. The last two are
    /// authenticated with the fresh token.
    pub fn login(&self, username: &str, password: &str) -> Result<Account, ApiError> {
        let request = self.client.build_login(username, password)?;
        let token = self.client.parse_login(self.execute(&request)?)?;

        let principal = Principal::Token(&token);
        let kind = self.account_kind(principal)?;
        let profile = self.user_profile(principal)?;

        tracing::debug!(username, ?kind, "logged in");
        Ok(Account::hydrate(kind, profile, Some(token)))
    }

    /// Look up another user by username. The result carries no token.
    pub fn lookup_account(&self, username: &str) -> Result<Account, ApiError> {
        let principal = Principal::Username(username);
        let kind = self.account_kind(principal)?;
        let profile = self.user_profile(principal)?;
        Ok(Account::hydrate(kind, profile, None))
    }

    pub fn account_kind(&self, principal: Principal<'_>) -> Result<AccountKind, ApiError> {
        let request = self.client.build_user_type(principal)?;
        self.client.parse_user_type(self.execute(&request)?)
    }

    pub fn user_profile(&self, principal: Principal<'_>) -> Result<ProfileRecord, ApiError> {
        let request = self.client.build_user_profile(principal)?;
        self.client.parse_user_profile(self.execute(&request)?)
    }

    /// Search instructors by locality and/or expertise; empty strings mean
    /// "no filter". At least one filter is required.
    pub fn find_instructors(
        &self,
        caller: &Account,
        locality: &str,
        expertise: &str,
    ) -> Result<Vec<Instructor>, ApiError> {
        let filter = InstructorFilter::new(locality, expertise);
        let request = self.client.build_find_instructors(caller.session_token(), &filter)?;
        let found = self.client.parse_find_instructors(self.execute(&request)?)?;
        tracing::debug!(count = found.len(), "instructors found");
        Ok(found)
    }

    pub fn list_engagements(&self, caller: &Account) -> Result<Vec<Engagement>, ApiError> {
        let request = self.client.build_list_engagements(caller.session_token());
        let engagements = self.client.parse_list_engagements(self.execute(&request)?)?;
        tracing::debug!(count = engagements.len(), "engagements listed");
        Ok(engagements)
    }

    /// Ask `instructor_username` for a session at `scheduled_at`.
    pub fn request_engagement(
        &self,
        learner: &Learner,
        instructor_username: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let request = self.client.build_request_engagement(
            learner.identity.session_token(),
            instructor_username,
            scheduled_at,
        )?;
        self.client.parse_empty(self.execute(&request)?)
    }
}

/// Strip base address and API key so neither ends up in logs.
fn route_of<'a>(path: &'a str, config: &EndpointConfig) -> &'a str {
    let route = path.strip_prefix(config.base_address()).unwrap_or(path);
    route
        .strip_suffix(config.api_key())
        .and_then(|r| r.strip_suffix('/'))
        .unwrap_or(route)
}
