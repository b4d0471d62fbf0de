use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::datetime::parse_due_expr;
use crate::edit::EditSubmission;
use crate::manager::TaskBoard;
use crate::render::{Present, short_id};
use crate::store::TaskStore;
use crate::task::{Priority, Task};
use crate::view::{Filter, Sort};

#[instrument(skip(board, presenter, command))]
pub fn dispatch<S, P>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
    command: Command,
    today: NaiveDate,
) -> anyhow::Result<()>
where
    S: TaskStore,
    P: Present,
{
    debug!(?command, "dispatching command");

    match command {
        Command::Add {
            title,
            description,
            priority,
            due,
        } => cmd_add(board, presenter, title, description, priority, due, today),
        Command::List { filter, sort } => cmd_list(board, presenter, filter, sort),
        Command::Done { id } => cmd_done(board, presenter, &id),
        Command::Delete { id } => cmd_delete(board, presenter, &id),
        Command::Edit {
            id,
            title,
            description,
            priority,
            due,
        } => cmd_edit(board, presenter, &id, title, description, priority, due, today),
        Command::Search { query } => cmd_search(board, presenter, &query),
    }
}

/// Seeds the remembered view selections from the config. Run once per
/// session, before any intent; later intents must not clobber what the user
/// has since chosen.
pub fn seed_view_state<S: TaskStore>(board: &mut TaskBoard<S>, cfg: &Config) -> anyhow::Result<()> {
    if let Some(value) = cfg.get("default.filter") {
        let filter = Filter::parse(&value)
            .ok_or_else(|| anyhow!("invalid default.filter: {value}"))?;
        board.set_filter(filter);
    }
    if let Some(value) = cfg.get("default.sort") {
        let sort =
            Sort::parse(&value).ok_or_else(|| anyhow!("invalid default.sort: {value}"))?;
        board.set_sort(sort);
    }
    Ok(())
}

#[instrument(skip(board, presenter, title, description, priority, due, today))]
fn cmd_add<S: TaskStore, P: Present>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
    title: String,
    description: String,
    priority: String,
    due: String,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command add");

    if title.trim().is_empty() {
        // rejected without ceremony: nothing created, nothing reported
        debug!("add rejected: blank title");
        return render_current(board, presenter);
    }

    let priority =
        Priority::parse(&priority).ok_or_else(|| anyhow!("invalid priority: {priority}"))?;
    let due = parse_due_expr(&due, today)?;

    let id = board.add(title, description, priority, due);
    println!("Created task {}.", short_id(id));
    report_write(board);
    render_current(board, presenter)
}

#[instrument(skip(board, presenter, filter, sort))]
fn cmd_list<S: TaskStore, P: Present>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
    filter: Option<String>,
    sort: Option<String>,
) -> anyhow::Result<()> {
    info!("command list");

    if let Some(value) = filter {
        let filter =
            Filter::parse(&value).ok_or_else(|| {
                anyhow!("unknown filter: {value} (expected all, done, or todo)")
            })?;
        board.set_filter(filter);
    }
    if let Some(value) = sort {
        let sort = Sort::parse(&value).ok_or_else(|| {
            anyhow!("unknown sort: {value} (expected none, priority, or due)")
        })?;
        board.set_sort(sort);
    }

    render_current(board, presenter)
}

#[instrument(skip(board, presenter))]
fn cmd_done<S: TaskStore, P: Present>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
    id: &str,
) -> anyhow::Result<()> {
    info!("command done");

    let task = resolve_task(board, id)?;
    board.toggle(task.id);

    let completed = board.get(task.id).map(|t| t.completed).unwrap_or(false);
    if completed {
        println!("Completed task {}.", short_id(task.id));
    } else {
        println!("Reopened task {}.", short_id(task.id));
    }
    report_write(board);
    render_current(board, presenter)
}

#[instrument(skip(board, presenter))]
fn cmd_delete<S: TaskStore, P: Present>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
    id: &str,
) -> anyhow::Result<()> {
    info!("command delete");

    let task = resolve_task(board, id)?;
    board.remove(task.id);
    println!("Deleted task {}.", short_id(task.id));
    report_write(board);
    render_current(board, presenter)
}

#[instrument(skip(board, presenter, title, description, priority, due, today))]
#[allow(clippy::too_many_arguments)]
fn cmd_edit<S: TaskStore, P: Present>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
    id: &str,
    title: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    due: Option<String>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command edit");

    let task = resolve_task(board, id)?;
    board.begin_edit(task.id);

    if title.is_none() && description.is_none() && priority.is_none() && due.is_none() {
        board.cancel_edit();
        println!("No changes.");
        return render_current(board, presenter);
    }

    // the submission is the full edit form, prefilled with current values
    let priority = match priority {
        Some(value) => Some(
            Priority::parse(&value).ok_or_else(|| anyhow!("invalid priority: {value}"))?,
        ),
        None => Some(task.priority),
    };
    let due = match due {
        Some(expr) => parse_due_expr(&expr, today)?,
        None => task.due,
    };
    let submission = EditSubmission {
        title: title.unwrap_or(task.title),
        description: Some(description.unwrap_or(task.description)),
        priority,
        due,
    };

    if board.save_edit(submission) {
        println!("Updated task {}.", short_id(task.id));
        report_write(board);
    }
    render_current(board, presenter)
}

#[instrument(skip(board, presenter))]
fn cmd_search<S: TaskStore, P: Present>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
    query: &str,
) -> anyhow::Result<()> {
    info!("command search");
    let rows = board.search_view(query);
    presenter.render(&rows)
}

fn render_current<S: TaskStore, P: Present>(
    board: &mut TaskBoard<S>,
    presenter: &mut P,
) -> anyhow::Result<()> {
    let rows = board.projection();
    presenter.render(&rows)
}

fn report_write<S: TaskStore>(board: &TaskBoard<S>) {
    if board.last_write_failed() {
        warn!("task list not saved, changes live in memory only");
        println!("Warning: the task list could not be saved.");
    }
}

/// Resolves a full id or a unique prefix of one to the task it names.
fn resolve_task<S: TaskStore>(board: &TaskBoard<S>, prefix: &str) -> anyhow::Result<Task> {
    let needle = prefix.trim().to_ascii_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(anyhow!("empty task id"));
    }

    let mut matches = board
        .tasks()
        .iter()
        .filter(|task| task.id.simple().to_string().starts_with(&needle));

    let first = matches.next().ok_or_else(|| anyhow!("no task matches id {prefix}"))?;
    if matches.next().is_some() {
        return Err(anyhow!("task id {prefix} is ambiguous"));
    }
    Ok(first.clone())
}
