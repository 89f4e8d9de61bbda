// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::application::dto::enrichment_request::{EnrichmentAcceptedDto, EnrichmentRequestDto};
use crate::application::usecases::aggregate_result::AggregateResultUseCase;
use crate::application::usecases::dispatch_enrichment::DispatchEnrichmentUseCase;
use crate::presentation::errors::AppError;

/// 提交富化任务
///
/// 任务持久化并发布工作消息后立即返回 202
pub async fn enqueue_enrichment(
    Extension(dispatch): Extension<Arc<DispatchEnrichmentUseCase>>,
    Json(payload): Json<EnrichmentRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = dispatch.execute(payload).await?;

    let body = EnrichmentAcceptedDto {
        task_id: receipt.task_id,
        status: "processing".to_string(),
        num_companies: receipt.items_total,
        degraded: receipt.is_degraded(),
    };
    Ok((StatusCode::ACCEPTED, Json(body)))
}

/// 接收 Worker 回调
///
/// 与结果队列消费共用同一个聚合用例；负载按原始文本解析，
/// 以便不合法的回调统一映射为 422
pub async fn aggregate_enrichment(
    Extension(aggregate): Extension<Arc<AggregateResultUseCase>>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let outcome = aggregate.execute_raw(&body).await?;
    info!(
        task_id = %outcome.task_id,
        state = %outcome.state,
        "Worker callback accepted over HTTP"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "processing",
            "taskId": outcome.task_id,
            "state": outcome.state,
        })),
    ))
}
