//! Pure transformations over an ordered task collection.
//!
//! # Responsibility
//! - Derive filtered views and counts on demand from the authoritative list.
//! - Apply clear/reorder transformations without touching persistence.
//!
//! # Invariants
//! - Derivations never cache; they are recomputed from the slice passed in.
//! - Reordering in a filtered view never moves tasks hidden by that filter.

use crate::model::task::{Task, TaskCounts, TaskFilter, TaskId};

/// Returns tasks visible under `filter`, preserving collection order.
pub fn filter_view(tasks: &[Task], filter: TaskFilter) -> Vec<&Task> {
    tasks.iter().filter(|task| task.matches(filter)).collect()
}

/// Counts active and completed tasks over the full collection.
pub fn count_tasks(tasks: &[Task]) -> TaskCounts {
    tasks.iter().fold(TaskCounts::default(), |mut counts, task| {
        if task.completed {
            counts.completed += 1;
        } else {
            counts.active += 1;
        }
        counts
    })
}

/// Returns the collection index of `id`, if present.
pub fn position_of(tasks: &[Task], id: TaskId) -> Option<usize> {
    tasks.iter().position(|task| task.id == id)
}

/// Removes completed tasks in place and returns how many were removed.
pub fn remove_completed(tasks: &mut Vec<Task>) -> usize {
    let before = tasks.len();
    tasks.retain(|task| !task.completed);
    before - tasks.len()
}

/// Moves `source_id` to the view position of `target_id`.
///
/// Positions are resolved within the view selected by `filter`. The moved
/// task lands at the target's prior view index and the tasks in between shift
/// by one. The new visible order is written back into the slots the visible
/// tasks already occupied, so hidden tasks keep their absolute positions.
///
/// Returns `false` (and leaves `tasks` untouched) when the ids are equal or
/// either id is not visible under `filter`.
pub fn move_within_view(
    tasks: &mut Vec<Task>,
    filter: TaskFilter,
    source_id: TaskId,
    target_id: TaskId,
) -> bool {
    if source_id == target_id {
        return false;
    }

    let visible_ids: Vec<TaskId> = tasks
        .iter()
        .filter(|task| task.matches(filter))
        .map(|task| task.id)
        .collect();
    let Some(from) = visible_ids.iter().position(|id| *id == source_id) else {
        return false;
    };
    let Some(to) = visible_ids.iter().position(|id| *id == target_id) else {
        return false;
    };

    let mut visible = Vec::with_capacity(visible_ids.len());
    let mut layout = Vec::with_capacity(tasks.len());
    for task in std::mem::take(tasks) {
        if task.matches(filter) {
            visible.push(task);
            layout.push(None);
        } else {
            layout.push(Some(task));
        }
    }

    let moved = visible.remove(from);
    visible.insert(to, moved);

    let mut visible = visible.into_iter();
    *tasks = layout
        .into_iter()
        .filter_map(|slot| slot.or_else(|| visible.next()))
        .collect();
    true
}

#[cfg(test)]
mod tests {
    use super::{count_tasks, filter_view, move_within_view, position_of, remove_completed};
    use crate::model::task::{Task, TaskFilter, TaskId};

    fn task(id: TaskId, completed: bool) -> Task {
        Task {
            id,
            text: format!("task {id}"),
            completed,
            created_at: id,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|task| task.id).collect()
    }

    #[test]
    fn view_preserves_order_per_filter() {
        let tasks = vec![task(1, true), task(2, false), task(3, true), task(4, false)];

        let all: Vec<TaskId> = filter_view(&tasks, TaskFilter::All)
            .iter()
            .map(|t| t.id)
            .collect();
        let active: Vec<TaskId> = filter_view(&tasks, TaskFilter::Active)
            .iter()
            .map(|t| t.id)
            .collect();
        let completed: Vec<TaskId> = filter_view(&tasks, TaskFilter::Completed)
            .iter()
            .map(|t| t.id)
            .collect();

        assert_eq!(all, vec![1, 2, 3, 4]);
        assert_eq!(active, vec![2, 4]);
        assert_eq!(completed, vec![1, 3]);
    }

    #[test]
    fn counts_cover_full_collection() {
        let tasks = vec![task(1, true), task(2, false), task(3, false)];
        let counts = count_tasks(&tasks);
        assert_eq!(counts.active, 2);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.total(), tasks.len());
        assert_eq!(count_tasks(&[]).total(), 0);
    }

    #[test]
    fn remove_completed_keeps_relative_order() {
        let mut tasks = vec![task(1, true), task(2, false), task(3, true), task(4, false)];
        assert_eq!(remove_completed(&mut tasks), 2);
        assert_eq!(ids(&tasks), vec![2, 4]);
        assert_eq!(position_of(&tasks, 4), Some(1));
        assert_eq!(position_of(&tasks, 1), None);
    }

    #[test]
    fn move_forward_and_backward_in_full_view() {
        let mut tasks = vec![task(1, false), task(2, false), task(3, false), task(4, false)];

        assert!(move_within_view(&mut tasks, TaskFilter::All, 1, 3));
        assert_eq!(ids(&tasks), vec![2, 3, 1, 4]);

        assert!(move_within_view(&mut tasks, TaskFilter::All, 4, 2));
        assert_eq!(ids(&tasks), vec![4, 2, 3, 1]);
    }

    #[test]
    fn move_in_filtered_view_keeps_hidden_slots() {
        let mut tasks = vec![task(1, true), task(2, false), task(3, false), task(4, true)];

        assert!(move_within_view(&mut tasks, TaskFilter::Active, 2, 3));
        assert_eq!(ids(&tasks), vec![1, 3, 2, 4]);
        assert!(tasks[0].completed);
        assert!(tasks[3].completed);
    }

    #[test]
    fn move_across_hidden_gap_only_permutes_visible_tasks() {
        let mut tasks = vec![
            task(1, false),
            task(2, true),
            task(3, false),
            task(4, true),
            task(5, false),
        ];

        assert!(move_within_view(&mut tasks, TaskFilter::Active, 5, 1));
        assert_eq!(ids(&tasks), vec![5, 2, 1, 4, 3]);
    }

    #[test]
    fn move_is_noop_for_same_or_hidden_ids() {
        let original = vec![task(1, true), task(2, false), task(3, false)];

        let mut tasks = original.clone();
        assert!(!move_within_view(&mut tasks, TaskFilter::All, 2, 2));
        assert!(!move_within_view(&mut tasks, TaskFilter::Active, 1, 3));
        assert!(!move_within_view(&mut tasks, TaskFilter::Active, 2, 99));
        assert_eq!(tasks, original);
    }
}
