// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use super::helpers::{
    create_test_app_with_options, enqueue, start_webhook_receiver, wait_for_task,
    worker_callback, TestAppOptions,
};
use axum::http::StatusCode;
use enrichrs::domain::models::task::TaskState;
use serde_json::Value;

/// 截止超时测试
///
/// 只收到部分回调的任务在截止后转为 TimedOut，并投递已到达的部分结果
#[tokio::test]
async fn test_deadline_sweep_delivers_partial_results() {
    let app = create_test_app_with_options(TestAppOptions {
        processing_window: chrono::Duration::milliseconds(300),
        ..TestAppOptions::default()
    })
    .await;
    let (webhook_url, received) = start_webhook_receiver(StatusCode::OK).await;
    let task_id = enqueue(&app.server, &webhook_url, &[(1, "Acme"), (2, "Globex")]).await;

    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 1, &[88]).to_string())
        .await
        .assert_status(StatusCode::ACCEPTED);

    // 截止前扫描不做任何事
    let report = app.deadline_worker.sweep_once().await.unwrap();
    assert_eq!(report.timed_out, 0);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let report = app.deadline_worker.sweep_once().await.unwrap();
    assert_eq!(report.timed_out, 1);

    let task = wait_for_task(&app.repository, task_id, |t| t.notified_at.is_some()).await;
    assert_eq!(task.state, TaskState::TimedOut);

    let deliveries = received.lock().clone();
    assert_eq!(deliveries.len(), 1);
    let payload: Value = deliveries[0].json();
    let results = payload["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["contacts"].as_array().unwrap().len(), 1);
    assert!(results[1]["contacts"].as_array().unwrap().is_empty());

    // 超时后到达的回调被忽略
    let response = app
        .server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 2, &[95]).to_string())
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["state"], "timed_out");

    let results: Value = app
        .server
        .get(&format!("/task/{}/results", task_id))
        .await
        .json();
    assert!(results["results"][1]["contacts"]
        .as_array()
        .unwrap()
        .is_empty());

    // 已结清的任务不会再被扫描
    let report = app.deadline_worker.sweep_once().await.unwrap();
    assert_eq!(report.timed_out, 0);
    assert_eq!(report.notified, 0);
    assert_eq!(received.lock().len(), 1);
}

/// 截止时间内没有任何回调的任务同样按超时投递
#[tokio::test]
async fn test_task_without_results_times_out() {
    let app = create_test_app_with_options(TestAppOptions {
        processing_window: chrono::Duration::milliseconds(100),
        ..TestAppOptions::default()
    })
    .await;
    let (webhook_url, received) = start_webhook_receiver(StatusCode::OK).await;
    let task_id = enqueue(&app.server, &webhook_url, &[(3, "Umbrella")]).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    app.deadline_worker.sweep_once().await.unwrap();

    let task = wait_for_task(&app.repository, task_id, |t| t.notified_at.is_some()).await;
    assert_eq!(task.state, TaskState::TimedOut);
    assert_eq!(task.items_received(), 0);

    let payload: Value = received.lock()[0].json();
    assert_eq!(payload["results"][0]["companyName"], "Umbrella");
}
