//! Derived Views
//!
//! Pure functions from a store snapshot (plus an explicit `now`) to the
//! aggregate records shown on dashboards:
//!
//! ```text
//! Project ──┬─ ProjectDashboard   goal/task counts, progress, estimates
//!           └─ Goal ─┬─ GoalProgress     task counts, overdue, days left
//!                    └─ Task ─ TaskDetails  names, dependencies, blockers
//! KnowledgeBase ─ KnowledgeWithReferences   resolved entity names
//! ```
//!
//! The task board filters and orders [`TaskDetails`] and splits them into
//! status columns.
//!
//! Nothing here is cached; callers recompute after every store change.

mod board;
mod details;
mod progress;

pub use board::{
    group_by_status, task_board, StatusColumn, TaskFilter, TaskSort, BOARD_ORDER,
};
pub use details::{
    knowledge_with_references, knowledge_with_references_all, task_details, task_details_all,
    KnowledgeWithReferences, ResolvedReference, TaskDetails,
};
pub use progress::{
    goal_progress, goal_progress_all, project_dashboard, project_dashboards, GoalProgress,
    ProjectDashboard,
};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::model::WorkStatus;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Completion percentage rounded half up; 0 when there is nothing to complete
pub fn percentage(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * done + total) / (2 * total)) as u32
}

/// Start of the due date in UTC
fn due_instant(due: NaiveDate) -> DateTime<Utc> {
    due.and_time(NaiveTime::MIN).and_utc()
}

/// Past due and not done. Cancelled items still count as overdue.
pub fn is_overdue(due: Option<NaiveDate>, status: WorkStatus, now: DateTime<Utc>) -> bool {
    match due {
        Some(due) => due_instant(due) < now && !status.is_done(),
        None => false,
    }
}

/// Whole days until the due date, rounded up; negative once past due
pub fn days_until_due(due: Option<NaiveDate>, now: DateTime<Utc>) -> Option<i64> {
    let millis = (due_instant(due?) - now).num_milliseconds();
    Some(div_ceil(millis, MILLIS_PER_DAY))
}

fn div_ceil(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b > 0 {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn test_overdue() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();

        assert!(is_overdue(Some(date(2024, 5, 9)), WorkStatus::Active, now));
        assert!(is_overdue(Some(date(2024, 5, 9)), WorkStatus::Cancelled, now));
        assert!(!is_overdue(Some(date(2024, 5, 9)), WorkStatus::Done, now));
        assert!(!is_overdue(Some(date(2024, 5, 11)), WorkStatus::Active, now));
        assert!(!is_overdue(None, WorkStatus::NotStarted, now));

        // Due today at midnight has already passed
        assert!(is_overdue(Some(date(2024, 5, 10)), WorkStatus::Active, now));
    }

    #[test]
    fn test_days_until_due() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();

        assert_eq!(days_until_due(None, now), None);
        assert_eq!(days_until_due(Some(date(2024, 5, 11)), now), Some(1));
        assert_eq!(days_until_due(Some(date(2024, 5, 17)), now), Some(7));
        assert_eq!(days_until_due(Some(date(2024, 5, 10)), now), Some(0));
        assert_eq!(days_until_due(Some(date(2024, 5, 9)), now), Some(-1));
        assert_eq!(days_until_due(Some(date(2024, 5, 8)), now), Some(-2));
        assert_eq!(days_until_due(Some(date(2024, 5, 12)), midnight), Some(2));
    }
}
