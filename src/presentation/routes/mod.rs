// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::usecases::aggregate_result::AggregateResultUseCase;
use crate::application::usecases::dispatch_enrichment::DispatchEnrichmentUseCase;
use crate::application::usecases::query_task::TaskQueryUseCase;
use crate::presentation::handlers::{enrichment_handler, task_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 路由依赖的用例集合
#[derive(Clone)]
pub struct AppServices {
    pub dispatch: Arc<DispatchEnrichmentUseCase>,
    pub aggregate: Arc<AggregateResultUseCase>,
    pub query: Arc<TaskQueryUseCase>,
}

/// 创建应用路由
///
/// # 参数
///
/// * `services` - 处理器使用的用例
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(services: AppServices) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version));

    let api_routes = Router::new()
        .route(
            "/enqueue_enrichment",
            post(enrichment_handler::enqueue_enrichment),
        )
        .route(
            "/aggregate_enrichment",
            post(enrichment_handler::aggregate_enrichment),
        )
        .route("/task/{id}", get(task_handler::get_task_status))
        .route("/task/{id}/results", get(task_handler::get_task_results));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(Extension(services.dispatch))
        .layer(Extension(services.aggregate))
        .layer(Extension(services.query))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
