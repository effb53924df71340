//! Typed operations on the backend's domain resources.
//!
//! Every call goes through the `Gateway`, so credentials are attached and
//! an expired session is handled uniformly. Resources are addressed by
//! slug, following the backend router (`courses/<slug>/`,
//! `<course_slug>/lessons/`, ...).

use futures::future::join_all;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ApiError, Gateway};
use crate::models::{
    AnswerOption, Assessment, Course, CourseDraft, Dashboard, Enrollment, Instructor, Lesson,
    Message, NewMessage, Question,
};

/// The backend answers a successful enrollment with a 400 carrying this text.
const ENROLLED_MARKER: &str = "Enrolled Successfully";

/// Clone is cheap - it only holds a `Gateway`.
#[derive(Clone)]
pub struct LmsClient {
    gateway: Gateway,
}

impl LmsClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// GET a collection, accepting both bare and paginated bodies
    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let response: ListResponse<T> = self.gateway.get(path).await?;
        Ok(response.into_vec())
    }

    // ===== Account =====

    /// Profile of the logged-in user as the backend sees it
    pub async fn profile(&self) -> Result<Value, ApiError> {
        self.gateway.get("accounts/profile/").await
    }

    // ===== Instructors =====

    pub async fn list_instructors(&self) -> Result<Vec<Instructor>, ApiError> {
        self.list("instructors/").await
    }

    pub async fn get_instructor(&self, username: &str) -> Result<Instructor, ApiError> {
        self.gateway.get(&format!("instructors/{}/", username)).await
    }

    /// Register the current user as an instructor
    pub async fn create_instructor(&self, bio: &str) -> Result<Instructor, ApiError> {
        self.gateway.post("instructors/", &json!({ "bio": bio })).await
    }

    // ===== Courses =====

    pub async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        let courses: Vec<Course> = self.list("courses/").await?;
        debug!(count = courses.len(), "Fetched courses");
        Ok(courses)
    }

    /// Courses whose title or description contains `query`, ignoring case
    pub async fn search_courses(&self, query: &str) -> Result<Vec<Course>, ApiError> {
        let courses = self.list_courses().await?;
        Ok(courses.into_iter().filter(|c| c.matches(query)).collect())
    }

    pub async fn get_course(&self, slug: &str) -> Result<Course, ApiError> {
        self.gateway.get(&format!("courses/{}/", slug)).await
    }

    pub async fn create_course(&self, draft: &CourseDraft) -> Result<Course, ApiError> {
        self.gateway.post("courses/", draft).await
    }

    pub async fn update_course(&self, slug: &str, draft: &CourseDraft) -> Result<Course, ApiError> {
        self.gateway.put(&format!("courses/{}/", slug), draft).await
    }

    pub async fn delete_course(&self, slug: &str) -> Result<(), ApiError> {
        self.gateway.delete(&format!("courses/{}/", slug)).await
    }

    // ===== Enrollments =====

    /// Enroll the current user; returns the backend's confirmation text.
    pub async fn enroll(&self, course_slug: &str) -> Result<String, ApiError> {
        let path = format!("{}/enrollments/", course_slug);
        match self.gateway.post::<Value, _>(&path, &json!({})).await {
            Ok(_) => Ok("Enrolled successfully".to_string()),
            Err(ApiError::ValidationFailed(msg)) if msg.contains(ENROLLED_MARKER) => {
                info!(course = course_slug, "Enrolled");
                Ok(msg)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_enrollments(&self, course_slug: &str) -> Result<Vec<Enrollment>, ApiError> {
        self.list(&format!("{}/enrollments/", course_slug)).await
    }

    // ===== Lessons =====

    pub async fn list_lessons(&self, course_slug: &str) -> Result<Vec<Lesson>, ApiError> {
        self.list(&format!("{}/lessons/", course_slug)).await
    }

    pub async fn get_lesson(&self, course_slug: &str, lesson_slug: &str) -> Result<Lesson, ApiError> {
        self.gateway
            .get(&format!("{}/lessons/{}/", course_slug, lesson_slug))
            .await
    }

    // ===== Assessments =====

    pub async fn list_assessments(
        &self,
        course_slug: &str,
        lesson_slug: &str,
    ) -> Result<Vec<Assessment>, ApiError> {
        self.list(&format!("{}/assessments/{}/", course_slug, lesson_slug))
            .await
    }

    pub async fn list_questions(
        &self,
        course_slug: &str,
        assessment_id: i64,
    ) -> Result<Vec<Question>, ApiError> {
        self.list(&format!("{}/assessment-{}/questions/", course_slug, assessment_id))
            .await
    }

    pub async fn list_options(
        &self,
        course_slug: &str,
        assessment_id: i64,
        question_id: i64,
    ) -> Result<Vec<AnswerOption>, ApiError> {
        self.list(&format!(
            "{}/assessment-{}/question-{}/options/",
            course_slug, assessment_id, question_id
        ))
        .await
    }

    // ===== Messages =====

    pub async fn list_messages(&self, course_slug: &str) -> Result<Vec<Message>, ApiError> {
        self.list(&format!("{}/messages/", course_slug)).await
    }

    pub async fn send_message(
        &self,
        course_slug: &str,
        receiver: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        let message = NewMessage {
            receiver: receiver.to_string(),
            content: content.to_string(),
        };
        self.gateway
            .post(&format!("{}/messages/", course_slug), &message)
            .await
    }

    // ===== Dashboard =====

    /// Progress summary across every visible course.
    ///
    /// Enrollment lists are fetched concurrently. Courses whose enrollments
    /// the user may not see are skipped; any other failure aborts.
    pub async fn fetch_dashboard(&self) -> Result<Dashboard, ApiError> {
        let courses = self.list_courses().await?;

        let fetches = courses.iter().map(|course| {
            let slug = course.slug();
            async move { (slug.clone(), self.list_enrollments(&slug).await) }
        });

        let mut enrollments = Vec::new();
        for (slug, result) in join_all(fetches).await {
            match result {
                Ok(mut list) => enrollments.append(&mut list),
                Err(ApiError::AccessDenied(_)) | Err(ApiError::NotFound(_)) => {
                    debug!(course = %slug, "Enrollments not visible, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Dashboard::build(&courses, &enrollments))
    }
}

/// Paginated list envelope some endpoints use instead of a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Page { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Page { results } => results,
            ListResponse::Bare(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStore, SessionStore};
    use crate::config::Config;
    use crate::events::{drain, EventSender, SessionEvent};
    use chrono::NaiveDate;
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn client(server: &Server) -> (LmsClient, UnboundedReceiver<SessionEvent>) {
        let (events, rx) = EventSender::channel();
        let store = SessionStore::new(Arc::new(MemoryStore::new()), events);
        let config = Config {
            api_base_url: format!("{}/api", server.url()),
            ..Config::default()
        };
        (LmsClient::new(Gateway::new(&config, store).unwrap()), rx)
    }

    const COURSES: &str = r#"[
        {"id": 1, "title": "Intro to Rust", "description": "Ownership", "start_date": "2025-01-06", "end_date": "2025-03-28"},
        {"id": 2, "title": "Async Rust", "description": "Futures and tokio", "start_date": null, "end_date": null}
    ]"#;

    #[tokio::test]
    async fn test_search_courses() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/courses/")
            .with_status(200)
            .with_body(COURSES)
            .create_async()
            .await;

        let (client, _rx) = client(&server);
        let found = client.search_courses("TOKIO").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Async Rust");
        assert_eq!(client.search_courses("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_enroll_treats_backend_marker_as_success() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/intro-to-rust/enrollments/")
            .with_status(400)
            .with_body(r#"["Enrolled Successfully!"]"#)
            .create_async()
            .await;
        server
            .mock("POST", "/api/async-rust/enrollments/")
            .with_status(400)
            .with_body(r#"{"detail": "You are already enrolled in this course."}"#)
            .create_async()
            .await;

        let (client, _rx) = client(&server);
        assert_eq!(client.enroll("intro-to-rust").await.unwrap(), "Enrolled Successfully!");
        assert!(matches!(
            client.enroll("async-rust").await,
            Err(ApiError::ValidationFailed(ref msg)) if msg == "You are already enrolled in this course."
        ));
    }

    #[tokio::test]
    async fn test_fetch_dashboard_skips_hidden_enrollments() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/courses/")
            .with_status(200)
            .with_body(COURSES)
            .create_async()
            .await;
        server
            .mock("GET", "/api/intro-to-rust/enrollments/")
            .with_status(200)
            .with_body(r#"[{"id": 1, "enrollment_date": "2025-01-07T09:00:00Z", "completed": true}, {"id": 2, "enrollment_date": "2025-01-08T09:00:00Z"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/async-rust/enrollments/")
            .with_status(403)
            .with_body(r#"{"detail": "You do not have permission to perform this action."}"#)
            .create_async()
            .await;

        let (client, _rx) = client(&server);
        let dashboard = client.fetch_dashboard().await.unwrap();
        assert_eq!(dashboard.stats.enrolled_courses, 2);
        assert_eq!(dashboard.stats.completed_courses, 1);
        assert_eq!(dashboard.stats.total_hours, 16);
        assert_eq!(dashboard.recent_courses.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_dashboard_propagates_session_expiry() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/courses/")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid token."}"#)
            .create_async()
            .await;

        let (client, mut rx) = client(&server);
        assert!(matches!(client.fetch_dashboard().await, Err(ApiError::SessionExpired)));
        let redirects = drain(&mut rx)
            .into_iter()
            .filter(|e| *e == SessionEvent::LoginRequired)
            .count();
        assert_eq!(redirects, 1);
    }

    #[tokio::test]
    async fn test_instructor_endpoints() {
        let mut server = Server::new_async().await;
        let get = server
            .mock("GET", "/api/instructors/grace/")
            .with_status(200)
            .with_body(r#"{"user": "grace", "bio": "Compilers"}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/instructors/")
            .match_body(Matcher::Json(json!({"bio": "Systems programming"})))
            .with_status(201)
            .with_body(r#"{"user": "ann", "bio": "Systems programming"}"#)
            .create_async()
            .await;

        let (client, _rx) = client(&server);
        let grace = client.get_instructor("grace").await.unwrap();
        assert_eq!(grace.bio, "Compilers");
        let ann = client.create_instructor("Systems programming").await.unwrap();
        assert_eq!(ann.user, "ann");

        get.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_course_write_endpoints() {
        let draft = CourseDraft {
            title: "Intro to Rust".to_string(),
            description: "Ownership".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 28).unwrap(),
        };
        let draft_json = json!({
            "title": "Intro to Rust",
            "description": "Ownership",
            "start_date": "2025-01-06",
            "end_date": "2025-03-28"
        });
        let created_body = r#"{"id": 7, "title": "Intro to Rust", "slug": "intro-to-rust", "description": "Ownership"}"#;

        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/api/courses/")
            .match_body(Matcher::Json(draft_json.clone()))
            .with_status(201)
            .with_body(created_body)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/api/courses/intro-to-rust/")
            .match_body(Matcher::Json(draft_json))
            .with_status(200)
            .with_body(created_body)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/courses/intro-to-rust/")
            .with_status(204)
            .create_async()
            .await;

        let (client, _rx) = client(&server);
        let course = client.create_course(&draft).await.unwrap();
        assert_eq!(course.slug(), "intro-to-rust");
        let updated = client.update_course(&course.slug(), &draft).await.unwrap();
        assert_eq!(updated.id, Some(7));
        client.delete_course("intro-to-rust").await.unwrap();

        create.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_lesson_and_assessment_paths() {
        let mut server = Server::new_async().await;
        let lesson = server
            .mock("GET", "/api/intro-to-rust/lessons/borrowing/")
            .with_status(200)
            .with_body(r#"{"title": "Borrowing", "slug": "borrowing", "description": "Shared and mutable references"}"#)
            .create_async()
            .await;
        let questions = server
            .mock("GET", "/api/intro-to-rust/assessment-3/questions/")
            .with_status(200)
            .with_body(r#"[{"question_text": "Who owns the value?", "options": [11, 12]}]"#)
            .create_async()
            .await;
        let options = server
            .mock("GET", "/api/intro-to-rust/assessment-3/question-5/options/")
            .with_status(200)
            .with_body(r#"{"count": 2, "results": [{"option_text": "The binding", "is_correct": true}, {"option_text": "The heap"}]}"#)
            .create_async()
            .await;

        let (client, _rx) = client(&server);
        let borrowing = client.get_lesson("intro-to-rust", "borrowing").await.unwrap();
        assert_eq!(borrowing.slug.as_deref(), Some("borrowing"));

        let found = client.list_questions("intro-to-rust", 3).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].options, vec![11, 12]);

        let choices = client.list_options("intro-to-rust", 3, 5).await.unwrap();
        assert_eq!(choices.len(), 2);
        assert!(choices[0].is_correct);
        assert!(!choices[1].is_correct);

        lesson.assert_async().await;
        questions.assert_async().await;
        options.assert_async().await;
    }

    #[test]
    fn test_list_response_shapes() {
        let page: ListResponse<i64> = serde_json::from_str(r#"{"count": 2, "results": [1, 2]}"#).unwrap();
        assert_eq!(page.into_vec(), vec![1, 2]);
        let bare: ListResponse<i64> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_vec(), vec![3]);
    }
}
