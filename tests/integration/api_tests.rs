// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, create_test_app_with_options, enqueue, worker_callback, TestAppOptions};
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

const UNREACHABLE_WEBHOOK: &str = "http://127.0.0.1:9/webhook";

/// 提交任务测试
///
/// 验证提交返回 202，并为每个公司发布一条工作消息
#[tokio::test]
async fn test_enqueue_publishes_one_message_per_company() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/enqueue_enrichment")
        .json(&json!({
            "formData": [
                { "companyName": "Acme", "companyId": 1 },
                { "companyName": "Globex", "companyId": 2 }
            ],
            "webhookUrl": UNREACHABLE_WEBHOOK
        }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["status"], "processing");
    assert_eq!(body["numCompanies"], 2);
    assert_eq!(body["degraded"], false);

    let messages = app.work_queue.drain_work();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].company_name, "Acme");
    assert_eq!(messages[1].company_id, 2);

    let task_id = body["taskId"].as_str().unwrap();
    assert!(messages.iter().all(|m| m.task_id.to_string() == task_id));

    let status: Value = app.server.get(&format!("/task/{}", task_id)).await.json();
    assert_eq!(status["state"], "processing");
    assert_eq!(status["itemsTotal"], 2);
    assert_eq!(status["itemsReceived"], 0);
}

#[tokio::test]
async fn test_enqueue_rejects_empty_form_data() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/enqueue_enrichment")
        .json(&json!({ "formData": [], "webhookUrl": UNREACHABLE_WEBHOOK }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(app.work_queue.is_empty());
}

#[tokio::test]
async fn test_enqueue_rejects_unsupported_webhook_scheme() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/enqueue_enrichment")
        .json(&json!({
            "formData": [{ "companyName": "Acme", "companyId": 1 }],
            "webhookUrl": "ftp://hooks.example.com/done"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(app.work_queue.is_empty());
}

#[tokio::test]
async fn test_enqueue_requires_webhook_without_default() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/enqueue_enrichment")
        .json(&json!({ "formData": [{ "companyName": "Acme", "companyId": 1 }] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enqueue_falls_back_to_default_webhook() {
    let app = create_test_app_with_options(TestAppOptions {
        default_webhook_url: Some(UNREACHABLE_WEBHOOK.to_string()),
        ..TestAppOptions::default()
    })
    .await;

    let response = app
        .server
        .post("/enqueue_enrichment")
        .json(&json!({ "formData": [{ "companyName": "Acme", "companyId": 1 }] }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    assert_eq!(app.work_queue.len(), 1);
}

#[tokio::test]
async fn test_unknown_task_returns_404() {
    let app = create_test_app().await;
    let missing = Uuid::new_v4();

    app.server
        .get(&format!("/task/{}", missing))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/task/{}/results", missing))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// 回调接口测试
///
/// 验证低置信度联系人被过滤，部分结果可通过结果接口查询
#[tokio::test]
async fn test_aggregate_endpoint_merges_filtered_contacts() {
    let app = create_test_app().await;
    let task_id = enqueue(&app.server, UNREACHABLE_WEBHOOK, &[(1, "Acme"), (2, "Globex")]).await;

    let response = app
        .server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 1, &[85, 30]).to_string())
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["state"], "partial");

    let results: Value = app
        .server
        .get(&format!("/task/{}/results", task_id))
        .await
        .json();
    assert_eq!(results["state"], "partial");
    let companies = results["results"].as_array().unwrap();
    assert_eq!(companies.len(), 2);
    assert_eq!(companies[0]["companyName"], "Acme");
    assert_eq!(companies[0]["contacts"].as_array().unwrap().len(), 1);
    assert_eq!(companies[0]["contacts"][0]["confidenceScore"], 85);
    assert!(companies[1]["contacts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_aggregate_endpoint_rejects_malformed_payload() {
    let app = create_test_app().await;
    let task_id = enqueue(&app.server, UNREACHABLE_WEBHOOK, &[(1, "Acme")]).await;

    app.server
        .post("/aggregate_enrichment")
        .text("not json")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .post("/aggregate_enrichment")
        .text(json!({ "taskId": task_id, "contacts": [] }).to_string())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let status: Value = app.server.get(&format!("/task/{}", task_id)).await.json();
    assert_eq!(status["itemsReceived"], 0);
}

#[tokio::test]
async fn test_aggregate_endpoint_unknown_task_or_company() {
    let app = create_test_app().await;
    let task_id = enqueue(&app.server, UNREACHABLE_WEBHOOK, &[(1, "Acme")]).await;

    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(Uuid::new_v4(), 1, &[90]).to_string())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/aggregate_enrichment")
        .text(worker_callback(task_id, 42, &[90]).to_string())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
