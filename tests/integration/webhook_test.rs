// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use super::helpers::{
    create_test_app, create_test_app_with_options, enqueue, fast_retry_policy,
    start_webhook_receiver, wait_for_task, worker_callback, TestAppOptions, TEST_SECRET,
};
use axum::http::StatusCode;
use enrichrs::domain::models::task::TaskState;
use enrichrs::infrastructure::services::webhook_service_impl::{
    SIGNATURE_HEADER, TASK_ID_HEADER, TIMESTAMP_HEADER,
};
use enrichrs::workers::notifier::NotifyOutcome;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn expected_signature(timestamp: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, body).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// 端到端投递测试
///
/// 两个公司全部回调后投递一次签名的 Webhook，低置信度联系人被过滤
#[tokio::test]
async fn test_completed_task_delivers_signed_webhook_once() {
    let app = create_test_app().await;
    let (webhook_url, received) = start_webhook_receiver(StatusCode::OK).await;
    let task_id = enqueue(&app.server, &webhook_url, &[(1, "Acme"), (2, "Globex")]).await;

    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 1, &[85, 30]).to_string())
        .await
        .assert_status(StatusCode::ACCEPTED);
    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 2, &[70]).to_string())
        .await
        .assert_status(StatusCode::ACCEPTED);

    let task = wait_for_task(&app.repository, task_id, |t| t.notified_at.is_some()).await;
    assert_eq!(task.state, TaskState::Completed);
    assert_eq!(task.delivery_attempts, 1);

    // 完成后的重复回调不会再次投递
    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 2, &[99]).to_string())
        .await
        .assert_status(StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let deliveries = received.lock().clone();
    assert_eq!(deliveries.len(), 1);

    let delivery = &deliveries[0];
    let timestamp = delivery.headers[TIMESTAMP_HEADER].to_str().unwrap();
    let signature = delivery.headers[SIGNATURE_HEADER].to_str().unwrap();
    assert_eq!(signature, expected_signature(timestamp, &delivery.body));
    assert_eq!(
        delivery.headers[TASK_ID_HEADER].to_str().unwrap(),
        task_id.to_string()
    );

    let payload: Value = delivery.json();
    assert_eq!(payload["taskId"], task_id.to_string());
    let results = payload["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["companyId"], 1);
    assert_eq!(results[0]["contacts"].as_array().unwrap().len(), 1);
    assert_eq!(results[0]["contacts"][0]["confidenceScore"], 85);
    assert_eq!(results[1]["contacts"][0]["confidenceScore"], 70);
}

/// 投递失败测试
///
/// 接收端持续返回 500 时在重试耗尽后将任务标记为 Failed
#[tokio::test]
async fn test_failing_receiver_marks_task_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(header_exists(SIGNATURE_HEADER))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let app = create_test_app_with_options(TestAppOptions {
        policy: fast_retry_policy(3),
        ..TestAppOptions::default()
    })
    .await;
    let webhook_url = format!("{}/webhook", mock_server.uri());
    let task_id = enqueue(&app.server, &webhook_url, &[(7, "Initech")]).await;

    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 7, &[90]).to_string())
        .await
        .assert_status(StatusCode::ACCEPTED);

    let task = wait_for_task(&app.repository, task_id, |t| t.state == TaskState::Failed).await;
    assert!(task.notified_at.is_none());
    assert_eq!(task.delivery_attempts, 3);
    assert!(task.last_error.is_some());

    let status: Value = app.server.get(&format!("/task/{}", task_id)).await.json();
    assert_eq!(status["state"], "failed");
    assert!(status["lastError"].is_string());

    mock_server.verify().await;
}

/// 客户端错误不重试
#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app().await;
    let webhook_url = format!("{}/webhook", mock_server.uri());
    let task_id = enqueue(&app.server, &webhook_url, &[(7, "Initech")]).await;

    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 7, &[90]).to_string())
        .await
        .assert_status(StatusCode::ACCEPTED);

    let task = wait_for_task(&app.repository, task_id, |t| t.state == TaskState::Failed).await;
    assert_eq!(task.delivery_attempts, 1);

    mock_server.verify().await;
}

/// 并发通知测试
///
/// 同一任务的多次通知触发只产生一次投递
#[tokio::test]
async fn test_concurrent_notifications_deliver_once() {
    let app = create_test_app().await;
    let (webhook_url, received) = start_webhook_receiver(StatusCode::OK).await;
    let task_id = enqueue(&app.server, &webhook_url, &[(1, "Acme")]).await;

    // 直接调用用例合并结果，再并发触发通知
    app.aggregate
        .execute_raw(&worker_callback(task_id, 1, &[80]).to_string())
        .await
        .unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let notifier = app.notifier.clone();
            tokio::spawn(async move { notifier.notify(task_id).await.unwrap() })
        })
        .collect();
    for outcome in futures::future::join_all(handles).await {
        let outcome = outcome.unwrap();
        assert!(matches!(
            outcome,
            NotifyOutcome::Delivered | NotifyOutcome::Skipped
        ));
    }

    wait_for_task(&app.repository, task_id, |t| t.notified_at.is_some()).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(received.lock().len(), 1);
}
