// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::dto::worker_result::WorkerResultDto;
use crate::domain::models::task::{MergeOutcome, Task, TaskState};
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::contact_filter::ConfidenceFilter;
use crate::domain::services::notification_service::CompletionNotifier;
use crate::infrastructure::metrics::{RESULTS_IGNORED, RESULTS_MERGED, TASKS_COMPLETED};
use crate::utils::errors::EnrichmentError;

/// 一次聚合的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub task_id: Uuid,
    pub merge: MergeOutcome,
    /// 聚合后的任务状态
    pub state: TaskState,
}

impl AggregateOutcome {
    /// 本次合并是否使任务完成
    pub fn completed_task(&self) -> bool {
        matches!(self.merge, MergeOutcome::Merged { completed: true })
    }
}

/// 结果聚合用例
///
/// 过滤低置信度联系人后把单个 Worker 结果原子地合并进任务；
/// 合并使任务完成时通知投递方。
pub struct AggregateResultUseCase {
    repository: Arc<dyn TaskRepository>,
    filter: ConfidenceFilter,
    notifier: Arc<dyn CompletionNotifier>,
}

impl AggregateResultUseCase {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        filter: ConfidenceFilter,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            repository,
            filter,
            notifier,
        }
    }

    /// 处理原始回调消息
    pub async fn execute_raw(&self, raw: &str) -> Result<AggregateOutcome, EnrichmentError> {
        let dto = WorkerResultDto::parse(raw)?;
        self.execute(dto).await
    }

    /// 处理一条 Worker 回调
    ///
    /// # 返回值
    ///
    /// * `Ok(AggregateOutcome)` - 已合并，或重复/任务已终止时的空操作
    /// * `Err(EnrichmentError::InvalidResult)` - 负载不合法，任务未被修改
    /// * `Err(EnrichmentError::NotFound)` - 任务不存在或已淘汰
    /// * `Err(EnrichmentError::ItemNotFound)` - 任务中没有对应公司
    pub async fn execute(
        &self,
        dto: WorkerResultDto,
    ) -> Result<AggregateOutcome, EnrichmentError> {
        let result = dto.into_result()?;
        let task_id = result.task_id;
        let company_id = result.company_id;
        let contacts = self.filter.apply(result.contacts);
        let error = result.error;
        let now = Utc::now();

        let mut merge = MergeOutcome::Duplicate;
        let mutated = self
            .repository
            .mutate(task_id, &mut |task: &mut Task| {
                merge = task.apply_result(company_id, contacts.clone(), error.clone(), now);
                matches!(merge, MergeOutcome::Merged { .. })
            })
            .await
            .map_err(|e| EnrichmentError::from_repository(task_id, e))?;

        let outcome = AggregateOutcome {
            task_id,
            merge,
            state: mutated.task.state,
        };

        match merge {
            MergeOutcome::UnknownItem => {
                return Err(EnrichmentError::ItemNotFound {
                    task_id,
                    company_id,
                });
            }
            MergeOutcome::Merged { completed } => {
                metrics::counter!(RESULTS_MERGED).increment(1);
                info!(
                    task_id = %task_id,
                    company_id,
                    received = mutated.task.items_received(),
                    total = mutated.task.items_total(),
                    "Worker result merged"
                );
                if completed {
                    metrics::counter!(TASKS_COMPLETED).increment(1);
                    info!(task_id = %task_id, "All companies processed");
                    self.notifier.task_finished(task_id).await;
                }
            }
            MergeOutcome::Duplicate | MergeOutcome::Terminal | MergeOutcome::Expired => {
                metrics::counter!(RESULTS_IGNORED).increment(1);
                debug!(
                    task_id = %task_id,
                    company_id,
                    outcome = ?merge,
                    "Worker result ignored"
                );
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "aggregate_result_test.rs"]
mod tests;
