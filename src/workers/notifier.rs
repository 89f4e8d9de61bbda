// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics::counter;
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::models::task::Task;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::notification_service::CompletionNotifier;
use crate::domain::services::webhook_service::WebhookService;
use crate::infrastructure::metrics::{WEBHOOKS_DELIVERED, WEBHOOKS_FAILED, WEBHOOK_ATTEMPTS};
use crate::utils::errors::WorkerError;
use crate::utils::retry_policy::RetryPolicy;

/// 一次通知的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Webhook 已成功投递
    Delivered,
    /// 任务不可通知、已通知或其他投递正在进行
    Skipped,
    /// 重试耗尽，任务已转为 Failed
    Failed,
}

/// 终止通知器
///
/// 任务进入完成或超时状态后投递 Webhook。发送前在原子变更中获取投递租约，
/// 只有租约持有者会发送；成功后仅在令牌仍匹配时写入 `notified_at`，
/// 因此并发触发最多产生一次投递。
#[derive(Clone)]
pub struct Notifier {
    repository: Arc<dyn TaskRepository>,
    webhook: Arc<dyn WebhookService>,
    policy: RetryPolicy,
    lease: Duration,
}

impl Notifier {
    /// 创建新的通知器
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `webhook` - Webhook 投递服务
    /// * `policy` - 投递重试策略
    /// * `lease` - 投递租约时长，应覆盖整个重试过程
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        webhook: Arc<dyn WebhookService>,
        policy: RetryPolicy,
        lease: Duration,
    ) -> Self {
        Self {
            repository,
            webhook,
            policy,
            lease,
        }
    }

    /// 投递任务的最终结果
    ///
    /// # 返回值
    ///
    /// * `Ok(NotifyOutcome)` - 投递结果
    /// * `Err(WorkerError)` - 仓库访问失败
    pub async fn notify(&self, task_id: Uuid) -> Result<NotifyOutcome, WorkerError> {
        let token = Uuid::new_v4();
        let now = Utc::now();
        let lease = self.lease;

        let mut claimed = false;
        let mutated = self
            .repository
            .mutate(task_id, &mut |task: &mut Task| {
                claimed = task.claim_delivery(token, now, lease);
                claimed
            })
            .await?;
        if !claimed {
            return Ok(NotifyOutcome::Skipped);
        }

        let task = mutated.task;
        let payload = task.to_payload();
        info!(
            task_id = %task_id,
            state = %task.state,
            companies = payload.results.len(),
            with_contacts = payload.companies_with_contacts(),
            "Delivering webhook to {}",
            task.webhook_url
        );

        let mut attempt = 0;
        let last_error = loop {
            attempt += 1;
            counter!(WEBHOOK_ATTEMPTS).increment(1);

            match self.webhook.send_webhook(&task.webhook_url, &payload).await {
                Ok(()) => return self.finish_delivered(task_id, token, attempt).await,
                Err(e) => {
                    if !e.is_retryable() || !self.policy.should_retry(attempt) {
                        break e.to_string();
                    }
                    let backoff = self.policy.calculate_backoff(attempt);
                    warn!(
                        task_id = %task_id,
                        attempt,
                        "Webhook delivery failed, retrying in {:?}: {}",
                        backoff,
                        e
                    );
                    sleep(backoff).await;
                }
            }
        };

        self.finish_failed(task_id, token, attempt, last_error).await
    }

    async fn finish_delivered(
        &self,
        task_id: Uuid,
        token: Uuid,
        attempt: u32,
    ) -> Result<NotifyOutcome, WorkerError> {
        let now = Utc::now();
        let mutated = self
            .repository
            .mutate(task_id, &mut |task: &mut Task| {
                task.record_delivered(token, attempt, now)
            })
            .await?;
        if !mutated.changed {
            warn!(task_id = %task_id, "Delivery lease was lost before recording success");
        }

        counter!(WEBHOOKS_DELIVERED).increment(1);
        info!(task_id = %task_id, attempt, "Webhook delivered");
        Ok(NotifyOutcome::Delivered)
    }

    async fn finish_failed(
        &self,
        task_id: Uuid,
        token: Uuid,
        attempt: u32,
        last_error: String,
    ) -> Result<NotifyOutcome, WorkerError> {
        self.repository
            .mutate(task_id, &mut |task: &mut Task| {
                task.record_delivery_failure(token, attempt, last_error.clone())
            })
            .await?;

        counter!(WEBHOOKS_FAILED).increment(1);
        error!(
            task_id = %task_id,
            attempt,
            "Webhook delivery failed permanently: {}",
            last_error
        );
        Ok(NotifyOutcome::Failed)
    }
}

#[async_trait]
impl CompletionNotifier for Notifier {
    /// 在后台投递，不阻塞调用方
    async fn task_finished(&self, task_id: Uuid) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(task_id).await {
                error!(task_id = %task_id, "Failed to notify task completion: {}", e);
            }
        });
    }
}

#[cfg(test)]
#[path = "notifier_test.rs"]
mod tests;
