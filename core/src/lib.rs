//! Synchronous client SDK for the tutoring marketplace backend.
//!
//! # Overview
//! Lets an application act as a learner or an instructor: register, log in,
//! search for instructors, list engagements and request new ones. Requests
//! are built and responses parsed without touching the network; a
//! `Transport` performs the actual exchange.
//!
//! # Design
//! - `TutoringClient` is stateless and holds only an `EndpointConfig`. Each
//!   route is split into `build_*` (produces a request) and `parse_*`
//!   (consumes a response), so the I/O boundary is explicit.
//! - `Dispatcher` runs both halves around a `Transport`, one blocking
//!   exchange at a time.
//! - Every non-2xx status maps to exactly one `ApiError` variant.
//! - Wire DTOs live in `types`; `Account` and `Engagement` are hydrated from
//!   them and never expose the wire spelling.

pub mod account;
pub mod client;
pub mod dispatcher;
pub mod endpoint;
pub mod engagement;
pub mod error;
pub mod http;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use account::{
    Account, AccountKind, Identity, Instructor, InstructorRegistration, Learner,
    LearnerRegistration,
};
pub use client::{Principal, TutoringClient};
pub use dispatcher::Dispatcher;
pub use endpoint::{configure, current, EndpointConfig};
pub use engagement::{Engagement, EngagementState};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
