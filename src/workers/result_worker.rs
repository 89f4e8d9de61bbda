// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::application::usecases::aggregate_result::{AggregateOutcome, AggregateResultUseCase};
use crate::infrastructure::metrics::{RESULTS_ORPHANED, RESULTS_REJECTED};
use crate::queue::work_queue::ResultQueue;
use crate::utils::errors::{EnrichmentError, WorkerError};
use crate::workers::worker::Worker;

/// 结果消费工作器
///
/// 从结果队列读取 Worker 回调并交给聚合用例，使用信号量限制并发。
/// 不同任务的结果互不影响；同一任务的并发合并由仓库的原子变更保证。
pub struct ResultWorker {
    queue: Arc<dyn ResultQueue>,
    aggregate: Arc<AggregateResultUseCase>,
    poll_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl ResultWorker {
    /// 创建新的结果消费工作器
    ///
    /// # 参数
    ///
    /// * `queue` - 结果队列
    /// * `aggregate` - 聚合用例
    /// * `poll_timeout` - 单次读取的等待时间
    /// * `concurrency` - 同时处理的最大消息数
    pub fn new(
        queue: Arc<dyn ResultQueue>,
        aggregate: Arc<AggregateResultUseCase>,
        poll_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            queue,
            aggregate,
            poll_timeout,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// 处理单条原始消息
    ///
    /// 孤立消息（任务不存在或已淘汰）和不合法消息只记录日志后丢弃。
    pub async fn handle_message(
        aggregate: &AggregateResultUseCase,
        raw: &str,
    ) -> Option<AggregateOutcome> {
        match aggregate.execute_raw(raw).await {
            Ok(outcome) => Some(outcome),
            Err(EnrichmentError::NotFound(task_id)) => {
                counter!(RESULTS_ORPHANED).increment(1);
                warn!(task_id = %task_id, "Dropping orphaned worker result, task is unknown or evicted");
                None
            }
            Err(EnrichmentError::ItemNotFound {
                task_id,
                company_id,
            }) => {
                counter!(RESULTS_ORPHANED).increment(1);
                warn!(
                    task_id = %task_id,
                    company_id,
                    "Dropping worker result for a company that is not part of the task"
                );
                None
            }
            Err(EnrichmentError::InvalidResult(reason)) => {
                counter!(RESULTS_REJECTED).increment(1);
                warn!("Rejecting malformed worker result: {}", reason);
                None
            }
            Err(e) => {
                error!("Failed to aggregate worker result: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Worker for ResultWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Result worker started");

        loop {
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| WorkerError::InternalError(e.to_string()))?;

            let raw = match self.queue.receive(self.poll_timeout).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    error!("Failed to receive worker result: {}", e);
                    drop(permit);
                    sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let aggregate = self.aggregate.clone();
            tokio::spawn(async move {
                if let Some(outcome) = Self::handle_message(&aggregate, &raw).await {
                    debug!(
                        task_id = %outcome.task_id,
                        state = %outcome.state,
                        "Worker result processed"
                    );
                }
                drop(permit);
            });
        }
    }

    fn name(&self) -> &str {
        "result_worker"
    }
}
