//! In-memory repository for task board tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{NewTask, Partition, ProjectId, Shift, Task, TaskId, plan_move, plan_removal},
    ports::{
        EditTaskRequest, MoveTaskRequest, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
    },
};

/// Thread-safe in-memory task repository.
///
/// All state sits behind one lock, so each operation is a single critical
/// section and concurrent moves serialize.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

impl InMemoryTaskState {
    /// Counts tasks in a partition, leaving out `excluding` when given.
    fn count_in(
        &self,
        partition: Partition,
        excluding: Option<TaskId>,
    ) -> TaskRepositoryResult<u32> {
        let count = self
            .tasks
            .values()
            .filter(|task| task.partition() == partition && Some(task.id()) != excluding)
            .count();
        u32::try_from(count).map_err(TaskRepositoryError::persistence)
    }

    fn apply_shift(&mut self, project_id: ProjectId, shift: &Shift, moved: TaskId) {
        for sibling in self.tasks.values_mut() {
            if sibling.id() == moved || sibling.project_id() != project_id {
                continue;
            }
            if shift.covers(sibling.status(), sibling.position()) {
                let shifted = shift.apply(sibling.position());
                sibling.shift_to(shifted);
            }
        }
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn append(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.write_state()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }

        let count = state.count_in(task.partition(), None)?;
        let stored = task.append_after(count);
        state.tasks.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn edit_task(&self, request: EditTaskRequest) -> TaskRepositoryResult<Task> {
        let mut state = self.write_state()?;
        let current = state
            .tasks
            .get(&request.task_id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(request.task_id))?;

        let mut edited = current.clone();
        edited.apply_details(&request.edit, request.edited_at);
        if let Some(column) = request.edit.relocation(&current) {
            let destination = Partition::new(current.project_id(), column);
            let others = state.count_in(destination, Some(current.id()))?;
            let plan = plan_move(&current, column, i64::MAX, others);
            for shift in plan.shifts() {
                state.apply_shift(current.project_id(), shift, current.id());
            }
            edited.relocate(plan.column(), plan.position(), request.edited_at);
        }
        state.tasks.insert(edited.id(), edited.clone());
        Ok(edited)
    }

    async fn move_task(&self, request: MoveTaskRequest) -> TaskRepositoryResult<Task> {
        let mut state = self.write_state()?;
        let current = state
            .tasks
            .get(&request.task_id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(request.task_id))?;

        let destination = Partition::new(current.project_id(), request.column);
        let others = state.count_in(destination, Some(current.id()))?;
        let plan = plan_move(&current, request.column, request.order, others);

        for shift in plan.shifts() {
            state.apply_shift(current.project_id(), shift, current.id());
        }

        let mut moved = current;
        if !plan.is_noop() {
            moved.relocate(plan.column(), plan.position(), request.moved_at);
        }
        state.tasks.insert(moved.id(), moved.clone());
        Ok(moved)
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        let mut state = self.write_state()?;
        let removed = state
            .tasks
            .remove(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        state.apply_shift(removed.project_id(), &plan_removal(&removed), removed.id());
        Ok(removed)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id)
            .cloned()
            .collect();
        tasks.sort_by(Task::board_cmp);
        Ok(tasks)
    }
}
