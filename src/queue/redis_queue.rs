// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::message::WorkMessage;
use super::work_queue::{QueueError, ResultQueue, WorkQueue};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 空队列时的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 基于 Redis 列表的队列
///
/// 发布使用 RPUSH，接收使用 LPOP 轮询直到超时
pub struct RedisQueue {
    redis: Arc<RedisClient>,
    key: String,
}

impl RedisQueue {
    /// 创建新的 Redis 队列
    ///
    /// # 参数
    ///
    /// * `redis` - Redis客户端
    /// * `key` - 列表键名
    pub fn new(redis: Arc<RedisClient>, key: impl Into<String>) -> Self {
        Self {
            redis,
            key: key.into(),
        }
    }
}

#[async_trait]
impl WorkQueue for RedisQueue {
    async fn publish(&self, message: &WorkMessage) -> Result<(), QueueError> {
        let body = serde_json::to_string(message)?;
        self.redis
            .rpush(&self.key, &body)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ResultQueue for RedisQueue {
    async fn receive(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            let popped = self
                .redis
                .lpop(&self.key)
                .await
                .map_err(|e| QueueError::Backend(e.to_string()))?;
            if popped.is_some() {
                return Ok(popped);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}
