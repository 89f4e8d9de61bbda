// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use crate::domain::models::task::Task;
use crate::domain::repositories::task_repository::{
    Mutated, RepositoryError, TaskMutation, TaskRepository,
};

/// 内存任务仓库
///
/// 基于 DashMap 的按键锁实现原子读-改-写，用于单进程部署和测试。
/// 过期淘汰由保留 Worker 周期性调用 [`TaskRepository::evict_expired`] 完成。
pub struct MemoryTaskRepository {
    tasks: DashMap<Uuid, Task>,
    retention: Duration,
}

impl MemoryTaskRepository {
    /// 创建新的内存任务仓库
    ///
    /// # 参数
    ///
    /// * `retention` - 任务结清后的保留时长
    pub fn new(retention: Duration) -> Self {
        Self {
            tasks: DashMap::new(),
            retention,
        }
    }

    /// 当前保存的任务数
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        match self.tasks.entry(task.id) {
            Entry::Occupied(_) => Err(RepositoryError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(task.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Task, RepositoryError> {
        self.tasks
            .get(&id)
            .map(|task| task.clone())
            .ok_or(RepositoryError::NotFound)
    }

    async fn mutate(
        &self,
        id: Uuid,
        mutation: TaskMutation<'_>,
    ) -> Result<Mutated, RepositoryError> {
        // 持有分片写锁期间完成读-改-写，不跨越 await
        let mut entry = self.tasks.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        let mut working = entry.clone();
        let changed = mutation(&mut working);
        if changed {
            working.version = entry.version + 1;
            *entry = working.clone();
        }
        Ok(Mutated {
            task: working,
            changed,
        })
    }

    async fn find_overdue(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        let mut overdue: Vec<(DateTime<Utc>, Uuid)> = self
            .tasks
            .iter()
            .filter(|task| !task.is_settled() && task.is_overdue(now))
            .map(|task| (task.deadline_at, task.id))
            .collect();
        overdue.sort();
        Ok(overdue.into_iter().take(limit).map(|(_, id)| id).collect())
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let before = self.tasks.len();
        self.tasks
            .retain(|_, task| task.retain_until(self.retention) > now);
        Ok(before.saturating_sub(self.tasks.len()) as u64)
    }
}
