//! Async API client core for the campus management service.
//!
//! # Overview
//! Two pieces every screen of the campus app builds on:
//! - `ApiClient`: one generic `request` round trip plus typed wrappers for
//!   courses, students, grades, GPA, enrollments and calendar events.
//! - `FetchHook`: observable `{data, loading, error, refreshing}` state
//!   around a fetch, with manual refresh and refetch on focus.
//!
//! # Design
//! - The base URL lives in a `ClientConfig` injected at construction.
//! - `ApiClient` builds plain `HttpRequest` values and parses plain
//!   `HttpResponse` values; a `Transport` does the I/O in between.
//! - Fetch failures are caught by the hook, write failures by
//!   `run_mutation`; both show generic messages and log the details.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod alert;
pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch_state;
pub mod http;
pub mod mutation;
pub mod resources;
pub mod transport;
pub mod types;

pub use alert::{LogNotifier, Notifier};
pub use calendar::{covered_days, events_on, mark_calendar, DayMark, DayRole};
pub use client::{ApiClient, RequestOptions};
pub use config::ClientConfig;
pub use error::ApiError;
pub use fetch_state::{FetchHook, FetchState, FocusPolicy, Phase, FETCH_FAILED_MESSAGE};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mutation::{run_mutation, MutationError, MutationKind};
pub use resources::{save_route, ResourceId};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    CalendarEvent, Course, CourseInput, Enrollment, EnrollmentPayload, EventInput, Gpa, Grade,
    GradePayload, Student, StudentInput,
};
