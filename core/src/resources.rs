//! Typed wrappers for every campus resource operation.
//!
//! Each wrapper fixes the endpoint, method and body shape of one operation.
//! Create-versus-update is decided by `save_route` and nowhere else.

use std::fmt::Display;

use crate::client::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{
    CalendarEvent, Course, CourseInput, Enrollment, EnrollmentPayload, EventInput, Gpa, Grade,
    GradePayload, Student, StudentInput,
};

pub const COURSES: &str = "/courses";
pub const STUDENTS: &str = "/students";
pub const GRADES: &str = "/grades";
pub const ENROLLMENTS: &str = "/enrollments";
pub const EVENTS: &str = "/calendar/events";

/// An id that can address a saved resource. An empty string or a zero
/// number addresses nothing.
pub trait ResourceId: Display {
    fn is_unset(&self) -> bool;
}

impl ResourceId for &str {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl ResourceId for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl ResourceId for i64 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}

/// Method and endpoint for saving into `collection`.
///
/// A set id selects `PUT {collection}/{id}`; `None` or an unset id selects
/// `POST {collection}`.
pub fn save_route<I: ResourceId>(collection: &str, id: Option<I>) -> (HttpMethod, String) {
    match id.filter(|id| !id.is_unset()) {
        Some(id) => (HttpMethod::Put, format!("{collection}/{id}")),
        None => (HttpMethod::Post, collection.to_string()),
    }
}

impl ApiClient {
    async fn save<B, T, I>(&self, collection: &str, id: Option<I>, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
        I: ResourceId,
    {
        let (method, endpoint) = save_route(collection, id);
        self.request(&endpoint, RequestOptions::json(method, body)?).await
    }

    async fn delete<I: Display>(&self, collection: &str, id: I) -> Result<(), ApiError> {
        self.request(&format!("{collection}/{id}"), RequestOptions::method(HttpMethod::Delete))
            .await
    }

    // --- courses ---

    pub async fn fetch_courses(&self) -> Result<Vec<Course>, ApiError> {
        self.request(COURSES, RequestOptions::default()).await
    }

    pub async fn save_course(&self, course: &CourseInput, id: Option<&str>) -> Result<Course, ApiError> {
        self.save(COURSES, id, course).await
    }

    pub async fn delete_course(&self, id: &str) -> Result<(), ApiError> {
        self.delete(COURSES, id).await
    }

    // --- students ---

    pub async fn fetch_students(&self) -> Result<Vec<Student>, ApiError> {
        self.request(STUDENTS, RequestOptions::default()).await
    }

    pub async fn save_student(&self, student: &StudentInput, id: Option<&str>) -> Result<Student, ApiError> {
        self.save(STUDENTS, id, student).await
    }

    pub async fn delete_student(&self, id: &str) -> Result<(), ApiError> {
        self.delete(STUDENTS, id).await
    }

    // --- grades, GPA and enrollments ---

    pub async fn fetch_grades(&self, student_id: &str) -> Result<Vec<Grade>, ApiError> {
        self.request(&format!("{STUDENTS}/{student_id}/grades"), RequestOptions::default())
            .await
    }

    pub async fn add_grade(&self, grade: &GradePayload) -> Result<Grade, ApiError> {
        self.request(GRADES, RequestOptions::json(HttpMethod::Post, grade)?).await
    }

    pub async fn fetch_student_gpa(&self, student_id: &str) -> Result<Gpa, ApiError> {
        self.request(&format!("{STUDENTS}/{student_id}/gpa"), RequestOptions::default())
            .await
    }

    pub async fn fetch_student_enrolled_courses(&self, student_id: &str) -> Result<Vec<Course>, ApiError> {
        self.request(&format!("{STUDENTS}/{student_id}/courses"), RequestOptions::default())
            .await
    }

    pub async fn enroll_student(&self, student_id: &str, course_id: &str) -> Result<Enrollment, ApiError> {
        let payload = EnrollmentPayload {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
        };
        self.request(ENROLLMENTS, RequestOptions::json(HttpMethod::Post, &payload)?)
            .await
    }

    // --- calendar ---

    pub async fn fetch_events(&self) -> Result<Vec<CalendarEvent>, ApiError> {
        self.request(EVENTS, RequestOptions::default()).await
    }

    /// Create or update an event. Inverted ranges are rejected before any
    /// request is sent.
    pub async fn save_event(&self, event: &EventInput, id: Option<i64>) -> Result<CalendarEvent, ApiError> {
        event.validate()?;
        self.save(EVENTS, id, event).await
    }

    pub async fn delete_event(&self, id: i64) -> Result<(), ApiError> {
        self.delete(EVENTS, id).await
    }
}
