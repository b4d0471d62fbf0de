use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::task::Task;

/// The named slot the task collection lives under.
pub const TASKS_SLOT: &str = "tasks";

/// Persistence boundary for the whole task collection. Every save overwrites
/// the slot with the full serialized sequence; there is no incremental write.
pub trait TaskStore {
    fn load(&self) -> anyhow::Result<Vec<Task>>;
    fn save(&self, tasks: &[Task]) -> anyhow::Result<()>;
}

/// One JSON array document per slot, under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path, slot: &str) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        let path = data_dir.join(format!("{slot}.json"));
        info!(file = %path.display(), "opened task store");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskStore for JsonFileStore {
    #[tracing::instrument(skip(self))]
    fn load(&self) -> anyhow::Result<Vec<Task>> {
        if !self.path.exists() {
            debug!(file = %self.path.display(), "no stored tasks yet");
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", self.path.display()))?;
        debug!(count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    #[tracing::instrument(skip(self, tasks))]
    fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        debug!(file = %self.path.display(), count = tasks.len(), "saving tasks atomically");

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, tasks)?;
        temp.flush()?;

        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{JsonFileStore, TASKS_SLOT, TaskStore};
    use crate::task::{Priority, Task};

    #[test]
    fn absent_slot_loads_as_empty() {
        let temp = tempdir().expect("tempdir");
        let store = JsonFileStore::open(temp.path(), TASKS_SLOT).expect("open");
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn saved_tasks_come_back_in_order() {
        let temp = tempdir().expect("tempdir");
        let store = JsonFileStore::open(temp.path(), TASKS_SLOT).expect("open");

        let tasks = vec![
            Task::new("first".to_string(), String::new(), Priority::Low, None),
            Task::new("second".to_string(), String::new(), Priority::High, None),
        ];
        store.save(&tasks).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, tasks[0].id);
        assert_eq!(loaded[1].id, tasks[1].id);
    }

    #[test]
    fn corrupt_slot_is_a_load_error() {
        let temp = tempdir().expect("tempdir");
        let store = JsonFileStore::open(temp.path(), TASKS_SLOT).expect("open");
        fs::write(store.path(), "{not json").expect("write");
        assert!(store.load().is_err());
    }

    #[test]
    fn slots_are_scoped_by_name() {
        let temp = tempdir().expect("tempdir");
        let a = JsonFileStore::open(temp.path(), "tasks").expect("open");
        let b = JsonFileStore::open(temp.path(), "archive").expect("open");

        a.save(&[Task::new("only in a".to_string(), String::new(), Priority::Low, None)])
            .expect("save");

        assert_eq!(a.load().expect("load").len(), 1);
        assert!(b.load().expect("load").is_empty());
    }
}
