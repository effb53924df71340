use serde::{Deserialize, Serialize};

use super::{Course, Enrollment};

/// Study hours credited per enrolled course
pub const HOURS_PER_COURSE: u32 = 8;

/// Number of courses shown in the "recent" list
const RECENT_COURSE_COUNT: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct DashboardStats {
    pub enrolled_courses: u32,
    pub completed_courses: u32,
    pub total_hours: u32,
    pub certificates: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_courses: Vec<Course>,
}

impl Dashboard {
    pub fn build(courses: &[Course], enrollments: &[Enrollment]) -> Self {
        let enrolled = enrollments.len() as u32;
        let completed = enrollments.iter().filter(|e| e.completed).count() as u32;

        Self {
            stats: DashboardStats {
                enrolled_courses: enrolled,
                completed_courses: completed,
                total_hours: enrolled * HOURS_PER_COURSE,
                certificates: completed,
            },
            recent_courses: courses.iter().take(RECENT_COURSE_COUNT).cloned().collect(),
        }
    }
}
