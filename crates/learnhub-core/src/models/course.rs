use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{contains_ignore_case, slugify};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Course {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    /// Not every backend serializer includes it; see `Course::slug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub enrolled_students: Option<u32>,
}

impl Course {
    /// The slug addressing this course: the one the backend sent, or the
    /// one it derives from the title.
    pub fn slug(&self) -> String {
        self.slug
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&self.title))
    }

    /// Case-insensitive match against title or description
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || contains_ignore_case(&self.title, query)
            || contains_ignore_case(&self.description, query)
    }

    pub fn date_range_display(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => {
                format!("{} - {}", start.format("%b %d, %Y"), end.format("%b %d, %Y"))
            }
            (Some(start), None) => format!("from {}", start.format("%b %d, %Y")),
            (None, Some(end)) => format!("until {}", end.format("%b %d, %Y")),
            (None, None) => "dates TBD".to_string(),
        }
    }
}

/// Fields sent when creating or updating a course.
#[derive(Debug, Clone, Serialize)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Enrollment {
    pub id: i64,
    pub enrollment_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Instructor {
    /// Username of the instructor's account
    pub user: String,
    #[serde(default)]
    pub bio: String,
}
