use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Datelike, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserKind {
    Student,
    Tutor,
}

impl UserKind {
    fn as_str(self) -> &'static str {
        match self {
            UserKind::Student => "STUDENT",
            UserKind::Tutor => "TUTOR",
        }
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub username: String,
    pub name: String,
    pub password: String,
    pub locality: String,
    pub kind: UserKind,
    pub expertise: String,
    pub allowed_weekdays: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub name: String,
    pub locality: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expertise: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub allowed_weekdays: String,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            name: user.name.clone(),
            locality: user.locality.clone(),
            expertise: user.expertise.clone(),
            allowed_weekdays: user.allowed_weekdays.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lecture {
    pub obj_id: i64,
    pub tutor: String,
    pub student: String,
    pub state: String,
    pub time: String,
    #[serde(skip)]
    pub scheduled: i64,
}

#[derive(Deserialize)]
pub struct RegisterStudent {
    pub username: String,
    pub name: String,
    pub password: String,
    pub locality: String,
}

#[derive(Deserialize)]
pub struct RegisterTutor {
    pub username: String,
    pub name: String,
    pub password: String,
    pub locality: String,
    pub expertise: String,
    #[serde(rename = "allowedWeekdays")]
    pub allowed_weekdays: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Deserialize)]
pub struct TutorFilter {
    pub locality: Option<String>,
    pub expertise: Option<String>,
}

#[derive(Deserialize)]
pub struct LectureRequest {
    pub tutor_username: String,
    pub scheduled: i64,
}

#[derive(Debug)]
pub struct Backend {
    api_key: String,
    users: HashMap<String, User>,
    sessions: HashMap<String, String>,
    lectures: Vec<Lecture>,
    next_lecture_id: i64,
}

impl Backend {
    fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            users: HashMap::new(),
            sessions: HashMap::new(),
            lectures: Vec::new(),
            next_lecture_id: 1,
        }
    }

    fn check_key(&self, key: &str) -> Result<(), StatusCode> {
        if key == self.api_key {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }

    /// The user behind a bearer token; 422 if the token is absent or unknown.
    fn session_user(&self, headers: &HeaderMap) -> Result<&User, StatusCode> {
        bearer(headers)
            .and_then(|token| self.sessions.get(token))
            .and_then(|username| self.users.get(username))
            .ok_or(StatusCode::UNPROCESSABLE_ENTITY)
    }

    /// Resolve a lookup subject: the bearer's user if a token is sent,
    /// otherwise the `{username}` body.
    fn subject(&self, headers: &HeaderMap, body: &Bytes) -> Result<&User, StatusCode> {
        if bearer(headers).is_some() {
            return self.session_user(headers);
        }
        let query: UsernameQuery = parse_body(body)?;
        self.users
            .get(&query.username)
            .ok_or(StatusCode::PRECONDITION_FAILED)
    }

    fn insert_user(&mut self, user: User) -> Result<(), StatusCode> {
        if self.users.contains_key(&user.username) {
            return Err(StatusCode::FORBIDDEN);
        }
        tracing::info!(username = %user.username, kind = user.kind.as_str(), "registered user");
        self.users.insert(user.username.clone(), user);
        Ok(())
    }
}

pub type Db = Arc<RwLock<Backend>>;

pub fn app(api_key: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::new(api_key)));
    Router::new()
        .route("/{key}", get(liveness))
        .route("/api/{key}", get(configuration))
        .route(
            "/api/register_student/{key}",
            put(register_student).post(register_student),
        )
        .route("/api/register_tutor/{key}", post(register_tutor))
        .route("/api/login/{key}", post(login))
        .route("/api/get_user_type/{key}", post(user_type))
        .route("/api/get_user_profile/{key}", post(user_profile))
        .route("/api/find_tutors/{key}", post(find_tutors))
        .route("/api/list_lectures/{key}", get(list_lectures))
        .route("/api/request_lecture/{key}", put(request_lecture))
        .with_state(db)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Bodies are parsed by hand so that malformed JSON is always a 400.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, StatusCode> {
    serde_json::from_slice(body).map_err(|_| StatusCode::BAD_REQUEST)
}

/// Weekday mask digits count from Sunday = 0.
fn weekday_allowed(mask: &str, at: DateTime<Utc>) -> bool {
    let day = at.weekday().num_days_from_sunday();
    mask.chars().filter_map(|c| c.to_digit(10)).any(|d| d == day)
}

async fn liveness(State(db): State<Db>, Path(key): Path<String>) -> Result<Response, StatusCode> {
    db.read().await.check_key(&key)?;
    Ok(Json(json!({"status": "ok"})).into_response())
}

async fn configuration(
    State(db): State<Db>,
    Path(key): Path<String>,
) -> Result<Response, StatusCode> {
    db.read().await.check_key(&key)?;
    Ok(Json(json!({
        "name": "tutoring-mock",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response())
}

async fn register_student(
    State(db): State<Db>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let mut backend = db.write().await;
    backend.check_key(&key)?;
    let input: RegisterStudent = parse_body(&body)?;
    backend.insert_user(User {
        username: input.username,
        name: input.name,
        password: input.password,
        locality: input.locality,
        kind: UserKind::Student,
        expertise: String::new(),
        allowed_weekdays: String::new(),
    })?;
    Ok(StatusCode::CREATED)
}

async fn register_tutor(
    State(db): State<Db>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let mut backend = db.write().await;
    backend.check_key(&key)?;
    let input: RegisterTutor = parse_body(&body)?;
    backend.insert_user(User {
        username: input.username,
        name: input.name,
        password: input.password,
        locality: input.locality,
        kind: UserKind::Tutor,
        expertise: input.expertise,
        allowed_weekdays: input.allowed_weekdays,
    })?;
    Ok(StatusCode::CREATED)
}

async fn login(
    State(db): State<Db>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let mut backend = db.write().await;
    backend.check_key(&key)?;
    let input: Login = parse_body(&body)?;
    match backend.users.get(&input.username) {
        Some(user) if user.password == input.password => {}
        _ => return Err(StatusCode::UNAUTHORIZED),
    }
    let token = Uuid::new_v4().simple().to_string();
    backend.sessions.insert(token.clone(), input.username);
    Ok(Json(json!({"access_token": token})).into_response())
}

/// Answers with raw text, not a JSON string.
async fn user_type(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let backend = db.read().await;
    backend.check_key(&key)?;
    let user = backend.subject(&headers, &body)?;
    Ok(user.kind.as_str().into_response())
}

async fn user_profile(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Profile>, StatusCode> {
    let backend = db.read().await;
    backend.check_key(&key)?;
    let user = backend.subject(&headers, &body)?;
    Ok(Json(Profile::from(user)))
}

async fn find_tutors(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let backend = db.read().await;
    backend.check_key(&key)?;
    backend.session_user(&headers)?;
    let filter: TutorFilter = parse_body(&body)?;

    let locality = filter.locality.filter(|l| !l.is_empty());
    let expertise = filter.expertise.filter(|e| !e.is_empty());
    if locality.is_none() && expertise.is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut found: Vec<Profile> = backend
        .users
        .values()
        .filter(|u| u.kind == UserKind::Tutor)
        .filter(|u| {
            locality
                .as_deref()
                .map_or(true, |l| u.locality.eq_ignore_ascii_case(l))
        })
        .filter(|u| {
            expertise.as_deref().map_or(true, |e| {
                u.expertise
                    .split(',')
                    .any(|tag| tag.trim().eq_ignore_ascii_case(e.trim()))
            })
        })
        .map(Profile::from)
        .collect();
    if found.is_empty() {
        return Err(StatusCode::PRECONDITION_FAILED);
    }
    found.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(Json(json!({"response": found})).into_response())
}

async fn list_lectures(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Lecture>>, StatusCode> {
    let backend = db.read().await;
    backend.check_key(&key)?;
    let user = backend.session_user(&headers)?;
    let lectures = backend
        .lectures
        .iter()
        .filter(|l| l.student == user.username || l.tutor == user.username)
        .cloned()
        .collect();
    Ok(Json(lectures))
}

async fn request_lecture(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let mut backend = db.write().await;
    backend.check_key(&key)?;
    let student = backend.session_user(&headers)?;
    if student.kind != UserKind::Student {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let student = student.username.clone();
    let input: LectureRequest = parse_body(&body)?;
    let at = DateTime::from_timestamp_millis(input.scheduled).ok_or(StatusCode::BAD_REQUEST)?;

    let tutor = backend
        .users
        .get(&input.tutor_username)
        .filter(|u| u.kind == UserKind::Tutor)
        .ok_or(StatusCode::PRECONDITION_FAILED)?;
    if !weekday_allowed(&tutor.allowed_weekdays, at) {
        return Err(StatusCode::PRECONDITION_FAILED);
    }
    let taken = backend
        .lectures
        .iter()
        .any(|l| l.tutor == input.tutor_username && l.scheduled == input.scheduled);
    if taken {
        return Err(StatusCode::PRECONDITION_FAILED);
    }

    let obj_id = backend.next_lecture_id;
    backend.next_lecture_id += 1;
    backend.lectures.push(Lecture {
        obj_id,
        tutor: input.tutor_username,
        student,
        state: "REQUESTED".to_string(),
        time: at.format("%Y-%m-%d").to_string(),
        scheduled: input.scheduled,
    });
    Ok(StatusCode::CREATED)
}
