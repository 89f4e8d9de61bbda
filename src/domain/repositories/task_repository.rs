// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 记录未找到（不存在或已过期淘汰）
    #[error("Record not found")]
    NotFound,
    /// 记录已存在
    #[error("Record already exists")]
    AlreadyExists,
    /// 并发冲突重试次数耗尽
    #[error("Too many concurrent modifications for task {0}")]
    Conflict(Uuid),
    /// 存储后端错误
    #[error("Backend error: {0}")]
    Backend(String),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 任务变更函数
///
/// 在存储层的原子读-改-写中执行。返回 `true` 表示任务被修改需要写回，
/// `false` 表示无需写入。发生并发冲突时该函数会针对最新状态被重新调用，
/// 因此它只能依赖传入的任务，不能有外部副作用（记录返回值除外）。
pub type TaskMutation<'a> = &'a mut (dyn FnMut(&mut Task) -> bool + Send);

/// 原子变更的结果
#[derive(Debug, Clone)]
pub struct Mutated {
    /// 变更后的任务（未修改时为当前任务）
    pub task: Task,
    /// 是否发生了写入
    pub changed: bool,
}

/// 任务仓库特质
///
/// 以任务ID为键的持久化存储，支持单个任务上的原子读-改-写。
/// 不同任务之间的变更完全独立，所有协调都依赖这里的按键原子性。
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建新任务，ID冲突时返回 `AlreadyExists`
    async fn create(&self, task: &Task) -> Result<(), RepositoryError>;

    /// 根据ID获取任务，不存在或已淘汰时返回 `NotFound`
    async fn find_by_id(&self, id: Uuid) -> Result<Task, RepositoryError>;

    /// 原子地对任务应用变更函数
    ///
    /// 并发冲突在内部透明重试，调用方不会感知到冲突。
    async fn mutate(
        &self,
        id: Uuid,
        mutation: TaskMutation<'_>,
    ) -> Result<Mutated, RepositoryError>;

    /// 查找截止时间已过且尚未结清的任务
    async fn find_overdue(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Uuid>, RepositoryError>;

    /// 淘汰超过保留期的终止任务，返回淘汰数量
    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
