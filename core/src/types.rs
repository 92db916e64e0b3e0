//! Resource DTOs for the campus API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! integration tests catch drift between the two crates. Read shapes carry
//! the server-assigned `id`, write shapes (`*Input`, `*Payload`) never do.
//! Field names are camelCase on the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub credits: u32,
    pub professor: String,
}

/// Body of a course create or update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseInput {
    pub name: String,
    pub credits: u32,
    pub professor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub major: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentInput {
    pub name: String,
    pub major: String,
}

/// An academic calendar entry spanning `start_date..=end_date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CalendarEvent {
    pub fn is_single_day(&self) -> bool {
        self.start_date == self.end_date
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl EventInput {
    /// A single-day event.
    pub fn on(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date: date,
            end_date: date,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.end_date < self.start_date {
            return Err(ApiError::InvalidEvent {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

/// A recorded grade as projected by the server. Grades are only ever created
/// through `GradePayload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: i64,
    pub course_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradePayload {
    pub student_id: String,
    pub course_id: String,
    pub score: f64,
}

/// Grade point average; `None` when the student has no grades yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Gpa {
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPayload {
    pub student_id: String,
    pub course_id: String,
}

/// Confirmation returned by `POST /enrollments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
}
