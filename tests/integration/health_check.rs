// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_app;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::util::ServiceExt;

/// 健康检查测试
///
/// 验证健康检查端点是否正常工作
#[tokio::test]
async fn health_check_works() {
    let app = create_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn version_reports_package_version() {
    let app = create_test_app().await;

    app.server
        .get("/version")
        .await
        .assert_text(env!("CARGO_PKG_VERSION"));
}

/// 未注册的路由返回 404
#[tokio::test]
async fn unknown_route_returns_404() {
    let app = create_test_app().await;

    app.server
        .get("/v1/enrichment")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
