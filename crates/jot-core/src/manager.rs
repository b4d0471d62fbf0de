use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::edit::{EditSession, EditSubmission};
use crate::store::TaskStore;
use crate::task::{Priority, Task, TaskPatch};
use crate::view::{self, Filter, Sort, ViewState};

/// One displayable row: a task plus whether it is the one being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due: Option<NaiveDate>,
    pub completed: bool,
    pub editing: bool,
}

impl TaskRow {
    fn new(task: &Task, editing: bool) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due: task.due,
            completed: task.completed,
            editing,
        }
    }
}

/// The task collection and everything derived from it: the remembered view
/// selections, the edit session, and the store the collection is written
/// through. Exclusively owned; all mutation goes through these methods.
pub struct TaskBoard<S: TaskStore> {
    store: S,
    tasks: Vec<Task>,
    view: ViewState,
    edit: EditSession,
    write_failed: bool,
}

impl<S: TaskStore> TaskBoard<S> {
    /// Loads whatever the store holds. Unreadable stored state degrades to an
    /// empty board rather than an error.
    pub fn open(store: S) -> Self {
        let tasks = match store.load() {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "stored tasks unreadable, starting empty");
                Vec::new()
            }
        };
        Self {
            store,
            tasks,
            view: ViewState::default(),
            edit: EditSession::default(),
            write_failed: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Whether the most recent write was lost. In that case the in-memory
    /// collection and the store diverge until the next successful write.
    pub fn last_write_failed(&self) -> bool {
        self.write_failed
    }

    pub fn add(
        &mut self,
        title: String,
        description: String,
        priority: Priority,
        due: Option<NaiveDate>,
    ) -> Uuid {
        let task = Task::new(title, description, priority, due);
        let id = task.id;
        debug!(%id, "adding task");
        self.tasks.push(task);
        self.persist();
        id
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            debug!(%id, "remove: no such task");
            return false;
        }
        if self.edit.is_editing(id) {
            self.edit.cancel();
        }
        self.persist();
        true
    }

    pub fn update(&mut self, id: Uuid, patch: &TaskPatch) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!(%id, "update: no such task");
            return false;
        };
        patch.apply(task);
        self.persist();
        true
    }

    pub fn toggle(&mut self, id: Uuid) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!(%id, "toggle: no such task");
            return false;
        };
        task.completed = !task.completed;
        self.persist();
        true
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.view.filter = filter;
    }

    /// Reorders the collection immediately; the sorted order becomes the new
    /// base order. The reorder itself is not written back until the next
    /// collection mutation.
    pub fn set_sort(&mut self, sort: Sort) {
        self.view.sort = sort;
        view::sort_tasks(&mut self.tasks, sort);
    }

    /// The projection to display: the remembered sort re-applied, then the
    /// remembered filter.
    pub fn projection(&mut self) -> Vec<TaskRow> {
        view::sort_tasks(&mut self.tasks, self.view.sort);
        let edit = self.edit;
        view::filter_tasks(&self.tasks, self.view.filter)
            .into_iter()
            .map(|task| TaskRow::new(task, edit.is_editing(task.id)))
            .collect()
    }

    /// One-shot search pass: supersedes the remembered filter for this
    /// derivation only, leaving it untouched.
    pub fn search_view(&mut self, query: &str) -> Vec<TaskRow> {
        view::sort_tasks(&mut self.tasks, self.view.sort);
        let edit = self.edit;
        view::search_tasks(&self.tasks, query)
            .into_iter()
            .map(|task| TaskRow::new(task, edit.is_editing(task.id)))
            .collect()
    }

    pub fn begin_edit(&mut self, id: Uuid) {
        if self.get(id).is_none() {
            debug!(%id, "edit: no such task");
            return;
        }
        self.edit.begin(id);
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.edit.target()
    }

    /// Always leaves the session idle. Returns whether an update was applied;
    /// a blank-titled submission is dropped without touching the task.
    pub fn save_edit(&mut self, submission: EditSubmission) -> bool {
        let Some(id) = self.edit.finish() else {
            debug!("save with no active edit session");
            return false;
        };
        match submission.into_patch() {
            Some(patch) => self.update(id, &patch),
            None => {
                debug!(%id, "edit save dropped: blank title");
                false
            }
        }
    }

    // The in-memory collection is the source of truth. A failed write is
    // logged and leaves the store stale until the next successful one; the
    // mutation that triggered it stands.
    fn persist(&mut self) {
        match self.store.save(&self.tasks) {
            Ok(()) => self.write_failed = false,
            Err(err) => {
                warn!(error = %err, "failed to save tasks, keeping in-memory state");
                self.write_failed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use anyhow::anyhow;
    use chrono::NaiveDate;

    use super::TaskBoard;
    use crate::edit::EditSubmission;
    use crate::store::TaskStore;
    use crate::task::{Priority, Task, TaskPatch};
    use crate::view::{Filter, Sort};

    /// Store backed by a shared Vec so tests can watch what gets written.
    #[derive(Clone, Default)]
    struct MemStore {
        slot: Rc<RefCell<Vec<Task>>>,
    }

    impl TaskStore for MemStore {
        fn load(&self) -> anyhow::Result<Vec<Task>> {
            Ok(self.slot.borrow().clone())
        }

        fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
            *self.slot.borrow_mut() = tasks.to_vec();
            Ok(())
        }
    }

    struct FailingStore;

    impl TaskStore for FailingStore {
        fn load(&self) -> anyhow::Result<Vec<Task>> {
            Err(anyhow!("disk on fire"))
        }

        fn save(&self, _tasks: &[Task]) -> anyhow::Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn add_toggle_delete_lifecycle() {
        let mut board = TaskBoard::open(MemStore::default());

        let id = board.add("Buy milk".to_string(), String::new(), Priority::Low, None);
        assert_eq!(board.tasks().len(), 1);
        assert!(!board.get(id).expect("task").completed);

        board.toggle(id);
        assert!(board.get(id).expect("task").completed);

        board.remove(id);
        assert!(board.tasks().is_empty());
    }

    #[test]
    fn toggle_twice_restores_the_original_state() {
        let mut board = TaskBoard::open(MemStore::default());
        let id = board.add("x".to_string(), String::new(), Priority::Low, None);

        board.toggle(id);
        board.toggle(id);
        assert!(!board.get(id).expect("task").completed);
    }

    #[test]
    fn ids_stay_unique_and_immutable_across_mutations() {
        let mut board = TaskBoard::open(MemStore::default());
        let first = board.add("a".to_string(), String::new(), Priority::Low, None);
        let second = board.add("b".to_string(), String::new(), Priority::High, None);
        board.remove(first);
        let third = board.add("c".to_string(), String::new(), Priority::Medium, None);

        board.update(
            second,
            &TaskPatch {
                title: Some("b2".to_string()),
                ..TaskPatch::default()
            },
        );

        let ids: HashSet<_> = board.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), board.tasks().len());
        assert!(ids.contains(&second));
        assert!(ids.contains(&third));
        assert!(!ids.contains(&first));
    }

    #[test]
    fn mutations_on_unknown_ids_are_no_ops() {
        let mut board = TaskBoard::open(MemStore::default());
        board.add("a".to_string(), String::new(), Priority::Low, None);

        let ghost = uuid::Uuid::new_v4();
        assert!(!board.remove(ghost));
        assert!(!board.toggle(ghost));
        assert!(!board.update(ghost, &TaskPatch::default()));
        assert_eq!(board.tasks().len(), 1);
    }

    #[test]
    fn every_mutation_is_written_through() {
        let store = MemStore::default();
        let mut board = TaskBoard::open(store.clone());

        let id = board.add("a".to_string(), String::new(), Priority::Low, None);
        assert_eq!(store.slot.borrow().len(), 1);

        board.toggle(id);
        assert!(store.slot.borrow()[0].completed);

        board.remove(id);
        assert!(store.slot.borrow().is_empty());
    }

    #[test]
    fn write_failure_keeps_the_in_memory_mutation() {
        let mut board = TaskBoard::open(FailingStore);
        assert!(board.tasks().is_empty());

        let id = board.add("survives".to_string(), String::new(), Priority::Low, None);
        assert!(board.last_write_failed());
        assert!(board.get(id).is_some());

        board.toggle(id);
        assert!(board.last_write_failed());
        assert!(board.get(id).expect("task").completed);
    }

    #[test]
    fn unreadable_store_opens_as_an_empty_board() {
        let board = TaskBoard::open(FailingStore);
        assert!(board.tasks().is_empty());
        assert!(!board.last_write_failed());
    }

    #[test]
    fn projection_reapplies_the_remembered_sort_after_a_mutation() {
        let mut board = TaskBoard::open(MemStore::default());
        board.add(
            "later".to_string(),
            String::new(),
            Priority::Low,
            Some(date(2025, 6, 1)),
        );
        board.set_sort(Sort::DueDate);

        // appended last, but due first, so the re-derived view leads with it
        board.add(
            "sooner".to_string(),
            String::new(),
            Priority::Low,
            Some(date(2025, 1, 1)),
        );

        let rows = board.projection();
        assert_eq!(rows[0].title, "sooner");
        assert_eq!(rows[1].title, "later");
    }

    #[test]
    fn projection_applies_the_remembered_filter() {
        let mut board = TaskBoard::open(MemStore::default());
        let a = board.add("a".to_string(), String::new(), Priority::Low, None);
        board.add("b".to_string(), String::new(), Priority::Low, None);
        board.toggle(a);

        board.set_filter(Filter::Completed);
        let rows = board.projection();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, a);

        board.set_filter(Filter::Incomplete);
        let rows = board.projection();
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0].id, a);
    }

    #[test]
    fn search_supersedes_but_does_not_replace_the_stored_filter() {
        let mut board = TaskBoard::open(MemStore::default());
        let a = board.add("alpha".to_string(), String::new(), Priority::Low, None);
        board.add("beta".to_string(), String::new(), Priority::Low, None);
        board.toggle(a);
        board.set_filter(Filter::Incomplete);

        // search sees the completed task even though the stored filter hides it
        let rows = board.search_view("alpha");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, a);

        // the stored filter is still in force afterwards
        let rows = board.projection();
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0].id, a);
        assert_eq!(board.view().filter, Filter::Incomplete);
    }

    #[test]
    fn starting_a_new_edit_retargets_the_session() {
        let mut board = TaskBoard::open(MemStore::default());
        let x = board.add("x".to_string(), String::new(), Priority::Low, None);
        let y = board.add("y".to_string(), String::new(), Priority::Low, None);

        board.begin_edit(x);
        board.begin_edit(y);
        assert_eq!(board.editing(), Some(y));

        let saved = board.save_edit(EditSubmission {
            title: "y renamed".to_string(),
            ..EditSubmission::default()
        });
        assert!(saved);
        assert_eq!(board.editing(), None);
        assert_eq!(board.get(y).expect("task").title, "y renamed");
        assert_eq!(board.get(x).expect("task").title, "x");
    }

    #[test]
    fn whitespace_title_save_is_dropped_but_still_idles() {
        let mut board = TaskBoard::open(MemStore::default());
        let id = board.add("keep me".to_string(), String::new(), Priority::High, None);

        board.begin_edit(id);
        let saved = board.save_edit(EditSubmission {
            title: "   ".to_string(),
            ..EditSubmission::default()
        });
        assert!(!saved);
        assert_eq!(board.editing(), None);
        assert_eq!(board.get(id).expect("task").title, "keep me");
        assert_eq!(board.get(id).expect("task").priority, Priority::High);
    }

    #[test]
    fn editing_an_unknown_id_is_ignored() {
        let mut board = TaskBoard::open(MemStore::default());
        board.begin_edit(uuid::Uuid::new_v4());
        assert_eq!(board.editing(), None);
    }

    #[test]
    fn removing_the_edited_task_cancels_the_session() {
        let mut board = TaskBoard::open(MemStore::default());
        let id = board.add("x".to_string(), String::new(), Priority::Low, None);

        board.begin_edit(id);
        board.remove(id);
        assert_eq!(board.editing(), None);

        // a save after the delete must not resurrect the task
        let saved = board.save_edit(EditSubmission {
            title: "zombie".to_string(),
            ..EditSubmission::default()
        });
        assert!(!saved);
        assert!(board.tasks().is_empty());
    }

    #[test]
    fn projection_flags_the_edited_row() {
        let mut board = TaskBoard::open(MemStore::default());
        let a = board.add("a".to_string(), String::new(), Priority::Low, None);
        board.add("b".to_string(), String::new(), Priority::Low, None);

        board.begin_edit(a);
        let rows = board.projection();
        for row in rows {
            assert_eq!(row.editing, row.id == a);
        }
    }
}
