// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::repositories::task_repository::RepositoryError;

/// 用例层错误类型
///
/// 调度、聚合和查询用例共享的错误分类。
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// 任务或条目不存在（或已被淘汰）
    #[error("Task {0} not found")]
    NotFound(Uuid),

    /// 公司条目不存在
    #[error("Company {company_id} is not part of task {task_id}")]
    ItemNotFound { task_id: Uuid, company_id: i64 },

    /// 提交请求不合法
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Worker 回调负载不合法
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// 任务ID冲突，属于内部不变量被破坏
    #[error("Task {0} already exists")]
    AlreadyExists(Uuid),

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl EnrichmentError {
    /// 将仓库的 `NotFound` 映射为带任务ID的错误
    pub fn from_repository(task_id: Uuid, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => EnrichmentError::NotFound(task_id),
            RepositoryError::AlreadyExists => EnrichmentError::AlreadyExists(task_id),
            other => EnrichmentError::Repository(other),
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("内部错误: {0}")]
    InternalError(String),
}
