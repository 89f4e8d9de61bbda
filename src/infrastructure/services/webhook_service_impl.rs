// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::WebhookPayload;
use crate::domain::services::webhook_service::{WebhookError, WebhookService};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// 签名请求头
pub const SIGNATURE_HEADER: &str = "X-Enrichment-Signature";
/// 时间戳请求头
pub const TIMESTAMP_HEADER: &str = "X-Enrichment-Timestamp";
/// 任务ID请求头
pub const TASK_ID_HEADER: &str = "X-Enrichment-Task-Id";

/// Webhook服务实现
///
/// 以 JSON POST 投递聚合结果；配置了密钥时对 `{timestamp}.{body}` 做 HMAC-SHA256 签名
pub struct WebhookServiceImpl {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 签名密钥
    secret: Option<String>,
}

impl WebhookServiceImpl {
    /// 创建新的 Webhook 服务实现
    ///
    /// # 参数
    ///
    /// * `secret` - 签名密钥，为空时不签名
    /// * `timeout` - 单次请求超时
    pub fn new(secret: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// 为负载生成签名
    fn generate_signature(&self, payload: &str, timestamp: i64) -> Option<String> {
        let secret = self.secret.as_ref()?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl WebhookService for WebhookServiceImpl {
    async fn send_webhook(&self, url: &str, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let timestamp = chrono::Utc::now().timestamp();
        let body = serde_json::to_string(payload)?;

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(TASK_ID_HEADER, payload.task_id.to_string());
        if let Some(signature) = self.generate_signature(&body, timestamp) {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| WebhookError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(WebhookError::Status { status, body })
        }
    }
}
