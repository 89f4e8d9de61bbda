// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::dto::task_response::{TaskResultsDto, TaskStatusDto};
use crate::domain::repositories::task_repository::TaskRepository;
use crate::utils::errors::EnrichmentError;

/// 任务查询用例
///
/// 只读访问任务状态和（可能不完整的）聚合结果
pub struct TaskQueryUseCase {
    repository: Arc<dyn TaskRepository>,
}

impl TaskQueryUseCase {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// 查询任务状态与进度
    pub async fn get_status(&self, task_id: Uuid) -> Result<TaskStatusDto, EnrichmentError> {
        let task = self
            .repository
            .find_by_id(task_id)
            .await
            .map_err(|e| EnrichmentError::from_repository(task_id, e))?;
        Ok(TaskStatusDto::from(&task))
    }

    /// 查询聚合结果
    pub async fn get_results(&self, task_id: Uuid) -> Result<TaskResultsDto, EnrichmentError> {
        let task = self
            .repository
            .find_by_id(task_id)
            .await
            .map_err(|e| EnrichmentError::from_repository(task_id, e))?;
        Ok(TaskResultsDto::from(&task))
    }
}
