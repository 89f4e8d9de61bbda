// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::enrichment_request::EnrichmentRequestDto;
use crate::domain::models::task::{CompanyRef, Task};
use crate::domain::repositories::task_repository::TaskRepository;
use crate::infrastructure::metrics::{TASKS_CREATED, WORK_PUBLISH_FAILURES};
use crate::queue::message::WorkMessage;
use crate::queue::work_queue::WorkQueue;
use crate::utils::errors::EnrichmentError;

/// 调度回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub task_id: Uuid,
    pub items_total: usize,
    /// 成功发布的工作消息数
    pub published: usize,
    /// 发布失败的工作消息数
    pub failed: usize,
}

impl DispatchReceipt {
    /// 是否有工作消息发布失败
    pub fn is_degraded(&self) -> bool {
        self.failed > 0
    }
}

/// 富化调度用例
///
/// 持久化新任务后为每个公司发布一条工作消息。发布失败不做同步重试，
/// 对应条目保持 Pending，直到截止扫描将任务转为超时。
pub struct DispatchEnrichmentUseCase {
    repository: Arc<dyn TaskRepository>,
    queue: Arc<dyn WorkQueue>,
    processing_window: Duration,
    default_webhook_url: Option<String>,
}

impl DispatchEnrichmentUseCase {
    /// 创建新的调度用例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `queue` - 工作队列
    /// * `processing_window` - 任务处理时限
    /// * `default_webhook_url` - 请求未携带投递地址时使用的默认地址
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        queue: Arc<dyn WorkQueue>,
        processing_window: Duration,
        default_webhook_url: Option<String>,
    ) -> Self {
        Self {
            repository,
            queue,
            processing_window,
            default_webhook_url: default_webhook_url.filter(|url| !url.is_empty()),
        }
    }

    /// 执行调度
    ///
    /// # 返回值
    ///
    /// * `Ok(DispatchReceipt)` - 任务已持久化
    /// * `Err(EnrichmentError)` - 输入不合法或持久化失败
    pub async fn execute(
        &self,
        request: EnrichmentRequestDto,
    ) -> Result<DispatchReceipt, EnrichmentError> {
        request
            .validate()
            .map_err(|e| EnrichmentError::InvalidInput(e.to_string()))?;

        let webhook_url = self.resolve_webhook_url(request.webhook_url)?;
        let companies: Vec<CompanyRef> = request.form_data.into_iter().map(Into::into).collect();

        let task = Task::new(webhook_url, companies, Utc::now(), self.processing_window)
            .map_err(|e| EnrichmentError::InvalidInput(e.to_string()))?;
        let task_id = task.id;

        self.repository
            .create(&task)
            .await
            .map_err(|e| EnrichmentError::from_repository(task_id, e))?;
        metrics::counter!(TASKS_CREATED).increment(1);

        let mut published = 0;
        let mut failed = 0;
        for item in &task.items {
            let message = WorkMessage {
                task_id,
                company_id: item.company_id,
                company_name: item.company_name.clone(),
            };
            match self.queue.publish(&message).await {
                Ok(()) => published += 1,
                Err(e) => {
                    failed += 1;
                    metrics::counter!(WORK_PUBLISH_FAILURES).increment(1);
                    warn!(
                        task_id = %task_id,
                        company_id = item.company_id,
                        "Failed to publish work message: {}",
                        e
                    );
                }
            }
        }

        if published > 0 {
            if let Err(e) = self
                .repository
                .mutate(task_id, &mut |task: &mut Task| task.mark_dispatched())
                .await
            {
                warn!(task_id = %task_id, "Failed to mark task as dispatched: {}", e);
            }
        }

        info!(
            task_id = %task_id,
            items = task.items_total(),
            published,
            failed,
            "Enrichment task dispatched"
        );

        Ok(DispatchReceipt {
            task_id,
            items_total: task.items_total(),
            published,
            failed,
        })
    }

    fn resolve_webhook_url(&self, requested: Option<String>) -> Result<String, EnrichmentError> {
        let raw = requested
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.default_webhook_url.clone())
            .ok_or_else(|| EnrichmentError::InvalidInput("webhookUrl is required".to_string()))?;

        let parsed = url::Url::parse(&raw)
            .map_err(|e| EnrichmentError::InvalidInput(format!("Invalid webhookUrl: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EnrichmentError::InvalidInput(format!(
                "Unsupported webhookUrl scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(raw)
    }
}

#[cfg(test)]
#[path = "dispatch_enrichment_test.rs"]
mod tests;
