use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl Filter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "none" => Some(Filter::All),
            "done" | "completed" => Some(Filter::Completed),
            "todo" | "active" | "incomplete" => Some(Filter::Incomplete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    None,
    Priority,
    #[default]
    DueDate,
}

impl Sort {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Sort::None),
            "pri" | "priority" => Some(Sort::Priority),
            "due" | "date" | "duedate" => Some(Sort::DueDate),
            _ => None,
        }
    }
}

/// The remembered view selections. Process-local: a fresh session starts
/// unfiltered in due-date order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewState {
    pub filter: Filter,
    pub sort: Sort,
}

/// Reorders `tasks` in place; the sorted order becomes the new base order.
/// Both orderings are stable, so ties keep their prior relative position.
pub fn sort_tasks(tasks: &mut [Task], sort: Sort) {
    match sort {
        Sort::None => {}
        Sort::Priority => {
            tasks.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
        }
        Sort::DueDate => {
            tasks.sort_by(|a, b| {
                cmp_due(a.due, b.due).then_with(|| b.priority.rank().cmp(&a.priority.rank()))
            });
        }
    }
}

// A task without a due date sorts strictly after every dated one; no
// sentinel "far future" date is involved.
fn cmp_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// View-only subsequence; the base order is untouched.
pub fn filter_tasks(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| match filter {
            Filter::All => true,
            Filter::Completed => task.completed,
            Filter::Incomplete => !task.completed,
        })
        .collect()
}

/// Case-insensitive substring match over title and description. The empty
/// query matches every task.
pub fn search_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle)
        })
        .collect()
}
