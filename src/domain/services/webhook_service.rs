// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::WebhookPayload;
use async_trait::async_trait;
use thiserror::Error;

/// Webhook投递错误
#[derive(Error, Debug)]
pub enum WebhookError {
    /// 对端返回非成功状态码
    #[error("Webhook delivery failed with status {status}: {body}")]
    Status { status: u16, body: String },
    /// 网络或超时错误
    #[error("Webhook transport error: {0}")]
    Transport(String),
    /// 负载序列化失败
    #[error("Webhook payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WebhookError {
    /// 判断错误是否值得重试
    ///
    /// 除 408 与 429 外的 4xx 响应说明请求本身被拒绝，重试不会改变结果。
    pub fn is_retryable(&self) -> bool {
        match self {
            WebhookError::Status { status, .. } => {
                !(400..500).contains(status) || *status == 408 || *status == 429
            }
            WebhookError::Transport(_) => true,
            WebhookError::Serialization(_) => false,
        }
    }
}

/// Webhook服务特质
///
/// 定义Webhook发送的核心逻辑，单次调用即一次投递尝试，重试由调用方负责。
#[async_trait]
pub trait WebhookService: Send + Sync {
    /// 发送Webhook
    ///
    /// # 参数
    ///
    /// * `url` - 投递地址
    /// * `payload` - 最终聚合结果
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 对端返回 2xx
    /// * `Err(WebhookError)` - 发送失败
    async fn send_webhook(&self, url: &str, payload: &WebhookPayload) -> Result<(), WebhookError>;
}
