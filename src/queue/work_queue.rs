// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::message::WorkMessage;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 队列后端不可用
    #[error("Queue backend error: {0}")]
    Backend(String),

    /// 消息序列化失败
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 工作队列特质
///
/// 每个公司对应一条工作消息，外部 Worker 消费后回调结果队列
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// 发布一条工作消息
    async fn publish(&self, message: &WorkMessage) -> Result<(), QueueError>;
}

/// 结果队列特质
#[async_trait]
pub trait ResultQueue: Send + Sync {
    /// 接收一条原始回调消息
    ///
    /// # 参数
    ///
    /// * `timeout` - 最长等待时间
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(String))` - 收到的原始 JSON 文本
    /// * `Ok(None)` - 等待超时
    /// * `Err(QueueError)` - 后端错误
    async fn receive(&self, timeout: Duration) -> Result<Option<String>, QueueError>;
}
