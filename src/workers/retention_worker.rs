// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::TaskRepository;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 任务保留清理工作器
///
/// 负责定期淘汰超过保留期的任务记录
pub struct RetentionWorker {
    repository: Arc<dyn TaskRepository>,
    interval: Duration,
}

impl RetentionWorker {
    pub fn new(repository: Arc<dyn TaskRepository>, interval: Duration) -> Self {
        Self {
            repository,
            interval,
        }
    }
}

#[async_trait]
impl Worker for RetentionWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Task retention worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            match self.repository.evict_expired(Utc::now()).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Evicted {} expired tasks", count);
                    }
                }
                Err(e) => {
                    error!("Failed to evict expired tasks: {}", e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "retention_worker"
    }
}
