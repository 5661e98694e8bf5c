use tasklist_core::{
    MemorySlotStore, PersistenceBridge, SlotStore, Task, TaskFilter, TaskId, TaskStore,
};

/// Seeds the slot with `(name, completed)` pairs in display order.
fn seeded(store: &MemorySlotStore, items: &[(&str, bool)]) -> Vec<TaskId> {
    let tasks: Vec<Task> = items
        .iter()
        .enumerate()
        .map(|(index, (name, completed))| Task {
            id: index as TaskId + 1,
            text: (*name).to_string(),
            completed: *completed,
            created_at: index as i64 + 1,
        })
        .collect();
    PersistenceBridge::new(store).save(&tasks).unwrap();
    tasks.iter().map(|task| task.id).collect()
}

fn names<S: SlotStore>(tasks: &TaskStore<S>) -> Vec<&str> {
    tasks.tasks().iter().map(|task| task.text.as_str()).collect()
}

#[test]
fn reorder_in_full_view_is_array_move() {
    let store = MemorySlotStore::new();
    let ids = seeded(&store, &[("A", false), ("B", false), ("C", false), ("D", false)]);
    let mut tasks = TaskStore::open(PersistenceBridge::new(&store)).unwrap();

    tasks.reorder(ids[0], ids[2]).unwrap();
    assert_eq!(names(&tasks), vec!["B", "C", "A", "D"]);

    tasks.reorder(ids[3], ids[1]).unwrap();
    assert_eq!(names(&tasks), vec!["D", "B", "C", "A"]);
}

#[test]
fn reorder_in_active_view_keeps_completed_tasks_in_place() {
    let store = MemorySlotStore::new();
    let ids = seeded(&store, &[("A", true), ("B", false), ("C", false), ("D", true)]);
    let mut tasks = TaskStore::open(PersistenceBridge::new(&store)).unwrap();
    tasks.set_filter(TaskFilter::Active);

    let view: Vec<&str> = tasks.view().iter().map(|task| task.text.as_str()).collect();
    assert_eq!(view, vec!["B", "C"]);

    tasks.reorder(ids[1], ids[2]).unwrap();

    assert_eq!(names(&tasks), vec!["A", "C", "B", "D"]);
    assert!(tasks.tasks()[0].completed);
    assert!(tasks.tasks()[3].completed);
}

#[test]
fn reorder_in_completed_view_only_permutes_completed_tasks() {
    let store = MemorySlotStore::new();
    let ids = seeded(
        &store,
        &[("A", true), ("B", false), ("C", true), ("D", false), ("E", true)],
    );
    let mut tasks = TaskStore::open(PersistenceBridge::new(&store)).unwrap();
    tasks.set_filter(TaskFilter::Completed);

    tasks.reorder(ids[4], ids[0]).unwrap();

    assert_eq!(names(&tasks), vec!["E", "B", "A", "D", "C"]);
}

#[test]
fn reorder_with_hidden_or_unknown_ids_is_noop() {
    let store = MemorySlotStore::new();
    let ids = seeded(&store, &[("A", true), ("B", false), ("C", false)]);
    let mut tasks = TaskStore::open(PersistenceBridge::new(&store)).unwrap();
    tasks.set_filter(TaskFilter::Active);
    let writes = store.write_count();

    tasks.reorder(ids[0], ids[2]).unwrap();
    tasks.reorder(ids[1], 404).unwrap();
    tasks.reorder(ids[1], ids[1]).unwrap();

    assert_eq!(names(&tasks), vec!["A", "B", "C"]);
    assert_eq!(store.write_count(), writes);
}

#[test]
fn reorder_is_persisted() {
    let store = MemorySlotStore::new();
    let ids = seeded(&store, &[("A", false), ("B", false), ("C", false)]);
    {
        let mut tasks = TaskStore::open(PersistenceBridge::new(&store)).unwrap();
        tasks.reorder(ids[2], ids[0]).unwrap();
    }

    let reopened = TaskStore::open(PersistenceBridge::new(&store)).unwrap();
    assert_eq!(names(&reopened), vec!["C", "A", "B"]);
}
