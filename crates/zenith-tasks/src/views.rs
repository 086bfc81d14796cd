//! Derived views over the task collection.
//!
//! Everything here is a pure function of the store's current snapshot:
//! recomputed on demand, never persisted. View layers consume these and call
//! back into the store's mutation operations.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::task::Task;

/// Case-insensitive substring search over title and description.
///
/// A blank query returns every task, in input order.
pub fn search<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return tasks.iter().collect();
    }
    tasks
        .iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&query)
                || t.description.to_lowercase().contains(&query)
        })
        .collect()
}

/// Split tasks into (pending, completed), preserving input order.
pub fn partition<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> (Vec<&'a Task>, Vec<&'a Task>) {
    tasks.into_iter().partition(|t| !t.is_completed)
}

/// Number of tasks due on each calendar day, over the whole collection.
///
/// Time of day is ignored; completion and any active search filter are not.
pub fn due_counts(tasks: &[Task]) -> HashMap<NaiveDate, usize> {
    let mut counts = HashMap::new();
    for task in tasks {
        *counts.entry(task.due_date.date_naive()).or_insert(0) += 1;
    }
    counts
}

/// Whether a task is overdue at the given instant.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.is_completed && task.due_date < now
}

/// Display form of a task's due date, e.g. "Mar 5, 2024".
pub fn format_due_date(task: &Task) -> String {
    task.due_date.format("%b %-d, %Y").to_string()
}

/// Month metadata for a Sunday-first calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    pub days_in_month: u32,
    /// Empty leading cells before day 1 (0 = the month starts on Sunday).
    pub leading_blanks: u32,
}

impl MonthGrid {
    /// Grid metadata for the given year and 1-based month.
    pub fn new(year: i32, month: u32) -> Self {
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
        let leading_blanks = first.weekday().num_days_from_sunday();

        let next_month_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let days_in_month = next_month_first
            .and_then(|d| d.pred_opt())
            .map(|d| d.day())
            .unwrap_or(30);

        Self {
            year: first.year(),
            month: first.month(),
            days_in_month,
            leading_blanks,
        }
    }

    /// Grid for the month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The previous month's grid.
    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// The next month's grid.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// The date of a 1-based day within this month, if in range.
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        if day == 0 || day > self.days_in_month {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::task::{Priority, Task};

    fn task(title: &str, description: &str, due: &str, completed: bool) -> Task {
        Task {
            id: format!("id-{}", title),
            title: title.to_string(),
            description: description.to_string(),
            due_date: due.parse().unwrap(),
            is_completed: completed,
            priority: Priority::Medium,
            steps: vec![],
            progress: 0,
        }
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tasks = vec![
            task("Buy milk", "", "2024-03-01T09:00:00Z", false),
            task("Walk dog", "", "2024-03-02T09:00:00Z", false),
        ];

        let hits = search(&tasks, "milk");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Buy milk");

        let hits = search(&tasks, "MILK");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_matches_description() {
        let tasks = vec![
            task("Errand", "pick up milk on the way", "2024-03-01T09:00:00Z", false),
            task("Walk dog", "", "2024-03-02T09:00:00Z", false),
        ];
        let hits = search(&tasks, "milk");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Errand");
    }

    #[test]
    fn test_search_blank_query_returns_all() {
        let tasks = vec![
            task("a", "", "2024-03-01T09:00:00Z", false),
            task("b", "", "2024-03-02T09:00:00Z", true),
        ];
        assert_eq!(search(&tasks, "").len(), 2);
        assert_eq!(search(&tasks, "   ").len(), 2);
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let tasks = vec![
            task("p1", "", "2024-03-01T09:00:00Z", false),
            task("c1", "", "2024-03-02T09:00:00Z", true),
            task("p2", "", "2024-03-03T09:00:00Z", false),
        ];

        let (pending, completed) = partition(&tasks);
        assert_eq!(pending.len() + completed.len(), tasks.len());
        assert!(pending.iter().all(|t| !t.is_completed));
        assert!(completed.iter().all(|t| t.is_completed));

        // Input order preserved within each side
        let pending_titles: Vec<&str> = pending.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(pending_titles, vec!["p1", "p2"]);
    }

    #[test]
    fn test_partition_composes_with_search() {
        let tasks = vec![
            task("Buy milk", "", "2024-03-01T09:00:00Z", false),
            task("Buy more milk", "", "2024-03-02T09:00:00Z", true),
            task("Walk dog", "", "2024-03-03T09:00:00Z", false),
        ];
        let (pending, completed) = partition(search(&tasks, "milk"));
        assert_eq!(pending.len(), 1);
        assert_eq!(completed.len(), 1);
    }

    #[test]
    fn test_due_counts_ignores_time_of_day() {
        let tasks = vec![
            task("morning", "", "2024-03-01T08:00:00Z", false),
            task("evening", "", "2024-03-01T20:00:00Z", true),
            task("other day", "", "2024-03-02T08:00:00Z", false),
        ];

        let counts = due_counts(&tasks);
        let march_first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let march_second = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(counts.get(&march_first), Some(&2));
        assert_eq!(counts.get(&march_second), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_is_overdue() {
        let now: DateTime<Utc> = "2024-01-02T00:00:00Z".parse().unwrap();

        let open = task("t", "", "2024-01-01T00:00:00Z", false);
        assert!(is_overdue(&open, now));

        let done = task("t", "", "2024-01-01T00:00:00Z", true);
        assert!(!is_overdue(&done, now));

        // Due later today is not overdue yet
        let upcoming = task("t", "", "2024-01-02T18:00:00Z", false);
        assert!(!is_overdue(&upcoming, now));
    }

    #[test]
    fn test_format_due_date() {
        let t = task("t", "", "2024-03-05T09:00:00Z", false);
        assert_eq!(format_due_date(&t), "Mar 5, 2024");
    }

    #[test]
    fn test_month_grid_regular_month() {
        // March 2024 starts on a Friday and has 31 days
        let grid = MonthGrid::new(2024, 3);
        assert_eq!(grid.days_in_month, 31);
        assert_eq!(grid.leading_blanks, 5);
    }

    #[test]
    fn test_month_grid_leap_february() {
        assert_eq!(MonthGrid::new(2024, 2).days_in_month, 29);
        assert_eq!(MonthGrid::new(2023, 2).days_in_month, 28);
    }

    #[test]
    fn test_month_grid_navigation_wraps_year() {
        let january = MonthGrid::new(2026, 1);
        let december = january.prev();
        assert_eq!((december.year, december.month), (2025, 12));
        let back = december.next();
        assert_eq!((back.year, back.month), (2026, 1));
    }

    #[test]
    fn test_month_grid_day_bounds() {
        let grid = MonthGrid::new(2024, 2);
        assert_eq!(
            grid.day(29),
            Some(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert!(grid.day(0).is_none());
        assert!(grid.day(30).is_none());
    }
}
