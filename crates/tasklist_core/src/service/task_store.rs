//! Task list state machine.
//!
//! # Responsibility
//! - Own the ordered collection and the active view filter.
//! - Apply user intents and write the collection through after each change.
//!
//! # Invariants
//! - This store is the sole mutator of its collection.
//! - Ids are pairwise distinct; new tasks are prepended.
//! - A no-op intent (blank text, unknown id) never writes.
//! - A failed write keeps the in-memory change and returns the error.
//! - The view filter is never persisted.

use crate::model::task::{normalize_task_text, Task, TaskCounts, TaskFilter, TaskId};
use crate::model::task_id::{Clock, SystemClock, TaskIdAllocator};
use crate::model::task_list::{
    count_tasks, filter_view, move_within_view, position_of, remove_completed,
};
use crate::repo::slot_repo::SlotStore;
use crate::service::persistence::{LoadError, PersistenceBridge, PersistenceError};
use log::{debug, info, warn};

/// Result of a mutating intent.
pub type StoreResult<T> = Result<T, PersistenceError>;

/// In-memory task collection with write-through persistence.
pub struct TaskStore<S: SlotStore, C: Clock = SystemClock> {
    tasks: Vec<Task>,
    filter: TaskFilter,
    bridge: PersistenceBridge<S>,
    clock: C,
    ids: TaskIdAllocator,
}

impl<S: SlotStore> TaskStore<S> {
    /// Hydrates a store from `bridge` using the wall clock.
    pub fn open(bridge: PersistenceBridge<S>) -> Result<Self, LoadError> {
        Self::open_with_clock(bridge, SystemClock)
    }
}

impl<S: SlotStore, C: Clock> TaskStore<S, C> {
    /// Hydrates a store from `bridge`.
    ///
    /// A malformed payload is logged and the session starts empty; the slot
    /// keeps its old value until the next mutation overwrites it.
    ///
    /// # Errors
    /// - `LoadError::Store` when the store rejects the read.
    pub fn open_with_clock(bridge: PersistenceBridge<S>, clock: C) -> Result<Self, LoadError> {
        let tasks = match bridge.load() {
            Ok(tasks) => tasks,
            Err(LoadError::Deserialization(err)) => {
                warn!(
                    "event=store_open module=store status=warn slot={} outcome=start_empty error={}",
                    bridge.slot_key(),
                    err
                );
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        info!(
            "event=store_open module=store status=ok slot={} count={}",
            bridge.slot_key(),
            tasks.len()
        );
        Ok(Self {
            ids: TaskIdAllocator::seeded_from(&tasks),
            tasks,
            filter: TaskFilter::default(),
            bridge,
            clock,
        })
    }

    /// Adds a task from raw input and returns its id.
    ///
    /// Blank input after trimming is ignored and returns `Ok(None)`, as does
    /// an add when every `i64` id is taken.
    pub fn add(&mut self, raw_text: &str) -> StoreResult<Option<TaskId>> {
        let Some(text) = normalize_task_text(raw_text) else {
            return Ok(None);
        };
        let now_ms = self.clock.now_ms();
        let Some(id) = self.ids.next_id(now_ms) else {
            warn!("event=task_add module=store status=error error_code=id_space_exhausted");
            return Ok(None);
        };

        self.tasks.insert(0, Task::new(id, text, now_ms));
        self.commit("add", Some(id))?;
        Ok(Some(id))
    }

    /// Flips `completed` for `id`; unknown ids are ignored.
    pub fn toggle(&mut self, id: TaskId) -> StoreResult<()> {
        let Some(index) = position_of(&self.tasks, id) else {
            return Ok(());
        };
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        self.commit("toggle", Some(id))
    }

    /// Replaces the text of `id` verbatim; unknown ids are ignored.
    ///
    /// Unlike `add`, the text is neither trimmed nor checked for blankness.
    pub fn edit(&mut self, id: TaskId, new_text: impl Into<String>) -> StoreResult<()> {
        let Some(index) = position_of(&self.tasks, id) else {
            return Ok(());
        };
        self.tasks[index].text = new_text.into();
        self.commit("edit", Some(id))
    }

    /// Removes `id`; unknown ids are ignored.
    pub fn delete(&mut self, id: TaskId) -> StoreResult<()> {
        let Some(index) = position_of(&self.tasks, id) else {
            return Ok(());
        };
        self.tasks.remove(index);
        self.commit("delete", Some(id))
    }

    /// Removes every completed task, keeping the order of the rest.
    ///
    /// Returns how many tasks were removed.
    pub fn clear_completed(&mut self) -> StoreResult<usize> {
        let removed = remove_completed(&mut self.tasks);
        if removed == 0 {
            return Ok(0);
        }
        self.commit("clear_completed", None)?;
        Ok(removed)
    }

    /// Moves `source_id` to the position of `target_id` in the current view.
    ///
    /// Tasks hidden by the active filter keep their absolute positions.
    /// Equal ids, or ids not visible in the view, are ignored.
    pub fn reorder(&mut self, source_id: TaskId, target_id: TaskId) -> StoreResult<()> {
        if !move_within_view(&mut self.tasks, self.filter, source_id, target_id) {
            return Ok(());
        }
        self.commit("reorder", Some(source_id))
    }

    /// Changes the view filter. Does not touch storage.
    pub fn set_filter(&mut self, filter: TaskFilter) {
        debug!("event=set_filter module=store status=ok filter={filter}");
        self.filter = filter;
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    /// Tasks visible under the current filter, in collection order.
    pub fn view(&self) -> Vec<&Task> {
        filter_view(&self.tasks, self.filter)
    }

    /// Active/completed counts over the full collection.
    pub fn counts(&self) -> TaskCounts {
        count_tasks(&self.tasks)
    }

    /// Full collection, ignoring the filter.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn persistence(&self) -> &PersistenceBridge<S> {
        &self.bridge
    }

    fn commit(&self, op: &'static str, id: Option<TaskId>) -> StoreResult<()> {
        let task_id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
        match self.bridge.save(&self.tasks) {
            Ok(()) => {
                debug!(
                    "event=task_{op} module=store status=ok task_id={task_id} count={}",
                    self.tasks.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=task_{op} module=store status=error task_id={task_id} count={} error_code=write_failed",
                    self.tasks.len()
                );
                Err(err)
            }
        }
    }
}
