// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::task_response::{TaskResultsDto, TaskStatusDto};
use crate::application::usecases::query_task::TaskQueryUseCase;
use crate::presentation::errors::AppError;

/// 查询任务状态
pub async fn get_task_status(
    Extension(query): Extension<Arc<TaskQueryUseCase>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskStatusDto>, AppError> {
    Ok(Json(query.get_status(task_id).await?))
}

/// 查询任务聚合结果，任务未完成时可能只包含部分结果
pub async fn get_task_results(
    Extension(query): Extension<Arc<TaskQueryUseCase>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResultsDto>, AppError> {
    Ok(Json(query.get_results(task_id).await?))
}
