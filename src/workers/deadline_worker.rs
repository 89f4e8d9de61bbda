// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use tracing::{debug, error, info, warn};

use crate::domain::models::task::Task;
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::domain::services::notification_service::CompletionNotifier;
use crate::infrastructure::metrics::TASKS_TIMED_OUT;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;

/// 一次扫描的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// 本次转为超时的任务数
    pub timed_out: usize,
    /// 触发通知的任务数
    pub notified: usize,
}

/// 截止时间扫描工作器
///
/// 周期性查找已过截止时间且未结清的任务：未终止的转为 TimedOut（保留部分结果），
/// 已终止但尚未通知的重新触发通知。
pub struct DeadlineWorker {
    repository: Arc<dyn TaskRepository>,
    notifier: Arc<dyn CompletionNotifier>,
    interval: Duration,
    batch_size: usize,
}

impl DeadlineWorker {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        notifier: Arc<dyn CompletionNotifier>,
        interval: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            repository,
            notifier,
            interval,
            batch_size: batch_size.max(1),
        }
    }

    /// 执行一次扫描
    pub async fn sweep_once(&self) -> Result<SweepReport, WorkerError> {
        let now = Utc::now();
        let overdue = self.repository.find_overdue(now, self.batch_size).await?;
        let mut report = SweepReport::default();

        for task_id in overdue {
            let mut expired = false;
            let mutated = match self
                .repository
                .mutate(task_id, &mut |task: &mut Task| {
                    expired = task.expire(now);
                    expired
                })
                .await
            {
                Ok(mutated) => mutated,
                Err(RepositoryError::NotFound) => {
                    debug!(task_id = %task_id, "Overdue task already evicted");
                    continue;
                }
                Err(e) => {
                    warn!(task_id = %task_id, "Failed to expire task: {}", e);
                    continue;
                }
            };

            if expired {
                report.timed_out += 1;
                counter!(TASKS_TIMED_OUT).increment(1);
                info!(
                    task_id = %task_id,
                    received = mutated.task.items_received(),
                    total = mutated.task.items_total(),
                    "Task timed out with partial results"
                );
            }

            if mutated.task.state.is_notifiable() && !mutated.task.is_settled() {
                report.notified += 1;
                self.notifier.task_finished(task_id).await;
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl Worker for DeadlineWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Deadline worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            match self.sweep_once().await {
                Ok(report) => {
                    if report.timed_out > 0 || report.notified > 0 {
                        info!(
                            timed_out = report.timed_out,
                            notified = report.notified,
                            "Deadline sweep finished"
                        );
                    }
                }
                Err(e) => {
                    error!("Deadline sweep failed: {}", e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "deadline_worker"
    }
}

#[cfg(test)]
#[path = "deadline_worker_test.rs"]
mod tests;
