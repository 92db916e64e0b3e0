use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub credits: u32,
    pub professor: String,
}

#[derive(Deserialize)]
pub struct CourseInput {
    pub name: String,
    pub credits: u32,
    pub professor: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub major: String,
}

#[derive(Deserialize)]
pub struct StudentInput {
    pub name: String,
    pub major: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: i64,
    pub course_name: String,
    pub score: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeInput {
    pub student_id: String,
    pub course_id: String,
    pub score: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Gpa {
    pub gpa: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A grade as stored: the public projection plus what GPA needs.
#[derive(Clone, Debug)]
struct GradeRecord {
    grade: Grade,
    student_id: String,
    course_id: String,
    credits: u32,
}

/// In-memory campus data. Lists keep insertion order.
#[derive(Default)]
pub struct Campus {
    courses: Vec<Course>,
    students: Vec<Student>,
    grades: Vec<GradeRecord>,
    enrollments: Vec<Enrollment>,
    events: Vec<CalendarEvent>,
    next_grade_id: i64,
    next_event_id: i64,
}

impl Campus {
    fn course(&self, id: &str) -> Result<&Course, ServerError> {
        self.courses
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ServerError::NotFound(format!("course {id} not found")))
    }

    fn student(&self, id: &str) -> Result<&Student, ServerError> {
        self.students
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ServerError::NotFound(format!("student {id} not found")))
    }

    /// Credit-weighted mean of the student's scores; a plain mean when every
    /// graded course is worth zero credits; `None` without grades.
    fn gpa(&self, student_id: &str) -> Option<f64> {
        let records: Vec<&GradeRecord> =
            self.grades.iter().filter(|g| g.student_id == student_id).collect();
        if records.is_empty() {
            return None;
        }
        let total_credits: u32 = records.iter().map(|g| g.credits).sum();
        if total_credits == 0 {
            let sum: f64 = records.iter().map(|g| g.grade.score).sum();
            return Some(sum / records.len() as f64);
        }
        let weighted: f64 = records.iter().map(|g| g.grade.score * f64::from(g.credits)).sum();
        Some(weighted / f64::from(total_credits))
    }
}

pub type Db = Arc<RwLock<Campus>>;

/// `EnvFilter` directives the binary uses when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "mock_server=debug";

/// Failure answered with a plain-text body.
#[derive(Debug)]
pub enum ServerError {
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ServerError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        }
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Campus::default()));
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/{id}", put(update_course).delete(delete_course))
        .route("/students", get(list_students).post(create_student))
        .route("/students/{id}", put(update_student).delete(delete_student))
        .route("/students/{id}/grades", get(student_grades))
        .route("/students/{id}/gpa", get(student_gpa))
        .route("/students/{id}/courses", get(student_courses))
        .route("/grades", post(add_grade))
        .route("/enrollments", post(enroll))
        .route("/calendar/events", get(list_events).post(create_event))
        .route("/calendar/events/{id}", put(update_event).delete(delete_event))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- courses ---

async fn list_courses(State(db): State<Db>) -> Json<Vec<Course>> {
    Json(db.read().await.courses.clone())
}

async fn create_course(
    State(db): State<Db>,
    Json(input): Json<CourseInput>,
) -> (StatusCode, Json<Course>) {
    let course = Course {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        credits: input.credits,
        professor: input.professor,
    };
    info!(id = %course.id, name = %course.name, "course created");
    db.write().await.courses.push(course.clone());
    (StatusCode::CREATED, Json(course))
}

async fn update_course(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<CourseInput>,
) -> Result<Json<Course>, ServerError> {
    let mut campus = db.write().await;
    let course = campus
        .courses
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| ServerError::NotFound(format!("course {id} not found")))?;
    course.name = input.name;
    course.credits = input.credits;
    course.professor = input.professor;
    let course = course.clone();
    for record in campus.grades.iter_mut().filter(|g| g.course_id == id) {
        record.grade.course_name = course.name.clone();
        record.credits = course.credits;
    }
    Ok(Json(course))
}

async fn delete_course(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let mut campus = db.write().await;
    campus.course(&id)?;
    campus.courses.retain(|c| c.id != id);
    campus.enrollments.retain(|e| e.course_id != id);
    info!(%id, "course deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- students ---

async fn list_students(State(db): State<Db>) -> Json<Vec<Student>> {
    Json(db.read().await.students.clone())
}

async fn create_student(
    State(db): State<Db>,
    Json(input): Json<StudentInput>,
) -> (StatusCode, Json<Student>) {
    let student = Student {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        major: input.major,
    };
    info!(id = %student.id, "student created");
    db.write().await.students.push(student.clone());
    (StatusCode::CREATED, Json(student))
}

async fn update_student(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<StudentInput>,
) -> Result<Json<Student>, ServerError> {
    let mut campus = db.write().await;
    let student = campus
        .students
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| ServerError::NotFound(format!("student {id} not found")))?;
    student.name = input.name;
    student.major = input.major;
    Ok(Json(student.clone()))
}

async fn delete_student(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let mut campus = db.write().await;
    campus.student(&id)?;
    campus.students.retain(|s| s.id != id);
    campus.grades.retain(|g| g.student_id != id);
    campus.enrollments.retain(|e| e.student_id != id);
    info!(%id, "student deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn student_grades(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Grade>>, ServerError> {
    let campus = db.read().await;
    campus.student(&id)?;
    let grades = campus
        .grades
        .iter()
        .filter(|g| g.student_id == id)
        .map(|g| g.grade.clone())
        .collect();
    Ok(Json(grades))
}

async fn student_gpa(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Gpa>, ServerError> {
    let campus = db.read().await;
    campus.student(&id)?;
    Ok(Json(Gpa { gpa: campus.gpa(&id) }))
}

async fn student_courses(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Course>>, ServerError> {
    let campus = db.read().await;
    campus.student(&id)?;
    let courses = campus
        .enrollments
        .iter()
        .filter(|e| e.student_id == id)
        .filter_map(|e| campus.course(&e.course_id).ok().cloned())
        .collect();
    Ok(Json(courses))
}

// --- grades and enrollments ---

async fn add_grade(
    State(db): State<Db>,
    Json(input): Json<GradeInput>,
) -> Result<(StatusCode, Json<Grade>), ServerError> {
    let mut campus = db.write().await;
    campus.student(&input.student_id)?;
    let course = campus.course(&input.course_id)?.clone();
    campus.next_grade_id += 1;
    let grade = Grade {
        id: campus.next_grade_id,
        course_name: course.name,
        score: input.score,
    };
    campus.grades.push(GradeRecord {
        grade: grade.clone(),
        student_id: input.student_id,
        course_id: course.id,
        credits: course.credits,
    });
    Ok((StatusCode::CREATED, Json(grade)))
}

async fn enroll(
    State(db): State<Db>,
    Json(input): Json<Enrollment>,
) -> Result<(StatusCode, Json<Enrollment>), ServerError> {
    let mut campus = db.write().await;
    campus.student(&input.student_id)?;
    campus.course(&input.course_id)?;
    if campus.enrollments.contains(&input) {
        return Err(ServerError::Conflict(format!(
            "student {} is already enrolled in course {}",
            input.student_id, input.course_id
        )));
    }
    campus.enrollments.push(input.clone());
    info!(student = %input.student_id, course = %input.course_id, "student enrolled");
    Ok((StatusCode::CREATED, Json(input)))
}

// --- calendar ---

fn check_range(input: &EventInput) -> Result<(), ServerError> {
    if input.end_date < input.start_date {
        return Err(ServerError::Unprocessable(format!(
            "endDate {} is before startDate {}",
            input.end_date, input.start_date
        )));
    }
    Ok(())
}

async fn list_events(State(db): State<Db>) -> Json<Vec<CalendarEvent>> {
    Json(db.read().await.events.clone())
}

async fn create_event(
    State(db): State<Db>,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<CalendarEvent>), ServerError> {
    check_range(&input)?;
    let mut campus = db.write().await;
    campus.next_event_id += 1;
    let event = CalendarEvent {
        id: campus.next_event_id,
        name: input.name,
        start_date: input.start_date,
        end_date: input.end_date,
    };
    campus.events.push(event.clone());
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<EventInput>,
) -> Result<Json<CalendarEvent>, ServerError> {
    check_range(&input)?;
    let mut campus = db.write().await;
    let event = campus
        .events
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| ServerError::NotFound(format!("event {id} not found")))?;
    event.name = input.name;
    event.start_date = input.start_date;
    event.end_date = input.end_date;
    Ok(Json(event.clone()))
}

async fn delete_event(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    let mut campus = db.write().await;
    let before = campus.events.len();
    campus.events.retain(|e| e.id != id);
    if campus.events.len() == before {
        return Err(ServerError::NotFound(format!("event {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
