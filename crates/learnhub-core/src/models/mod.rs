//! Data models for learning-platform entities.
//!
//! - `Course`, `Enrollment`, `Instructor`: catalog and membership
//! - `Lesson`, `Assessment`, `Question`, `AnswerOption`: course content
//! - `Message`: course messaging
//! - `Dashboard`: progress summary computed client-side

pub mod content;
pub mod course;
pub mod dashboard;
pub mod message;

pub use content::{AnswerOption, Assessment, Lesson, Question};
pub use course::{Course, CourseDraft, Enrollment, Instructor};
pub use dashboard::{Dashboard, DashboardStats, HOURS_PER_COURSE};
pub use message::{Message, NewMessage};
