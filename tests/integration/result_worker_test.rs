// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use super::helpers::{
    create_test_app, enqueue, start_webhook_receiver, wait_for_task, worker_callback,
};
use axum::http::StatusCode;
use enrichrs::domain::models::task::{ItemStatus, TaskState};
use enrichrs::workers::result_worker::ResultWorker;
use enrichrs::workers::Worker;
use serde_json::json;

/// 结果队列消费测试
///
/// 工作器从结果队列读取回调并合并，不合法和孤立消息被丢弃而不影响后续消息
#[tokio::test]
async fn test_result_worker_consumes_queue_until_completion() {
    let app = create_test_app().await;
    let (webhook_url, received) = start_webhook_receiver(StatusCode::OK).await;
    let task_id = enqueue(&app.server, &webhook_url, &[(1, "Acme"), (2, "Globex")]).await;

    app.result_queue.push_raw("{ broken");
    app.result_queue
        .push_raw(worker_callback(uuid::Uuid::new_v4(), 1, &[90]).to_string());
    app.result_queue
        .push_raw(worker_callback(task_id, 1, &[85, 30]).to_string());
    // 包裹形式的回调，携带 Worker 上报的错误
    app.result_queue.push_raw(
        json!({
            "task_id": task_id,
            "data": { "companyId": 2, "companyName": "Globex" },
            "error": "site unreachable"
        })
        .to_string(),
    );

    let worker = Arc::new(ResultWorker::new(
        app.result_queue.clone(),
        app.aggregate.clone(),
        Duration::from_millis(50),
        4,
    ));
    assert_eq!(worker.name(), "result_worker");
    let runner = worker.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    let task = wait_for_task(&app.repository, task_id, |t| t.notified_at.is_some()).await;
    handle.abort();

    assert_eq!(task.state, TaskState::Completed);
    assert!(task.items.iter().all(|i| i.status == ItemStatus::Received));
    assert_eq!(task.items[0].contacts.len(), 1);
    assert_eq!(task.items[1].error.as_deref(), Some("site unreachable"));
    assert!(app.result_queue.is_empty());
    assert_eq!(received.lock().len(), 1);
}

#[tokio::test]
async fn test_handle_message_drops_orphaned_results() {
    let app = create_test_app().await;

    let outcome = ResultWorker::handle_message(
        &app.aggregate,
        &worker_callback(uuid::Uuid::new_v4(), 5, &[70]).to_string(),
    )
    .await;
    assert!(outcome.is_none());

    let outcome = ResultWorker::handle_message(&app.aggregate, "[]").await;
    assert!(outcome.is_none());
}
