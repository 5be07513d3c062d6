//! Concurrent operations against the in-memory adapter.

use kanban::task::{
    domain::{ProjectId, TaskId, TaskStatus},
    services::{CreateTaskRequest, MoveTaskCommand},
};
use rstest::rstest;

use super::helpers::{COLUMNS, TestService, ensure_dense, service};

async fn seed(service: &TestService, project: ProjectId, count: usize) -> Vec<TaskId> {
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let request =
            CreateTaskRequest::new(project, Some(TaskStatus::Todo), format!("task {index}"));
        let task = service.create_task(request).await.expect("seed task");
        ids.push(task.id());
    }
    ids
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_moves_into_one_column_stay_dense(service: TestService) {
    let project = ProjectId::new();
    let ids = seed(&service, project, 12).await;

    let mut handles = Vec::new();
    for (index, id) in ids.into_iter().enumerate() {
        let worker = service.clone();
        let column = COLUMNS.get(index % COLUMNS.len()).copied().flatten();
        let order = i64::try_from(index % 3).expect("small order");
        handles.push(tokio::spawn(async move {
            worker
                .move_task(MoveTaskCommand::new(id, column, order))
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("move should succeed");
    }

    let tasks = service
        .list_project_tasks(project)
        .await
        .expect("list should succeed");
    assert_eq!(tasks.len(), 12);
    ensure_dense(&tasks).expect("columns stay dense");
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_and_deletes_stay_dense(service: TestService) {
    let project = ProjectId::new();
    let doomed = seed(&service, project, 6).await;

    let mut handles = Vec::new();
    for id in doomed {
        let worker = service.clone();
        handles.push(tokio::spawn(async move {
            worker.delete_task(id).await.map(|_| ())
        }));
    }
    for index in 0..6 {
        let worker = service.clone();
        handles.push(tokio::spawn(async move {
            let request =
                CreateTaskRequest::new(project, Some(TaskStatus::Todo), format!("new {index}"));
            worker.create_task(request).await.map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("operation should succeed");
    }

    let tasks = service
        .list_project_tasks(project)
        .await
        .expect("list should succeed");
    assert_eq!(tasks.len(), 6);
    ensure_dense(&tasks).expect("columns stay dense");
}
