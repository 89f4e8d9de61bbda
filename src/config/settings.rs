// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::utils::retry_policy::RetryPolicy;

/// 租约在最坏重试耗时之外额外保留的秒数
const LEASE_MARGIN_SECS: u64 = 5;

/// 应用程序配置设置
///
/// 包含服务器、Redis、任务存储、队列、任务时限、Webhook 和指标等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 任务存储配置
    pub store: StoreSettings,
    /// 队列配置
    pub queue: QueueSettings,
    /// 任务时限配置
    pub task: TaskSettings,
    /// Webhook 配置
    pub webhook: WebhookSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// Redis配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Redis,
    Memory,
}

/// 任务存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// 存储后端 (redis, memory)
    pub backend: Backend,
    /// Redis 键前缀
    pub key_prefix: String,
    /// 乐观并发冲突时的最大重试次数
    pub max_mutate_retries: u32,
}

/// 队列配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// 队列后端 (redis, memory)
    pub backend: Backend,
    /// 工作消息队列名
    pub work_queue: String,
    /// 结果回调队列名
    pub result_queue: String,
    /// 阻塞读取超时（秒）
    pub poll_timeout_secs: u64,
    /// 结果消费并发数
    pub consumer_concurrency: usize,
}

/// 任务时限配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSettings {
    /// 任务处理时限（秒）
    pub deadline_secs: u64,
    /// 任务记录保留时间（秒）
    pub retention_secs: u64,
    /// 截止扫描间隔（秒）
    pub sweep_interval_secs: u64,
    /// 每次扫描处理的最大任务数
    pub sweep_batch_size: usize,
    /// 联系人最低置信度
    pub min_confidence_score: u8,
}

impl TaskSettings {
    pub fn deadline(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.deadline_secs as i64)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Webhook配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSettings {
    /// 提交请求未携带 webhookUrl 时使用的默认地址
    pub default_url: Option<String>,
    /// Webhook签名密钥，为空时不签名
    pub secret: Option<String>,
    /// 最大投递次数
    pub max_attempts: u32,
    /// 初始退避（毫秒）
    pub initial_backoff_ms: u64,
    /// 最大退避（毫秒）
    pub max_backoff_ms: u64,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 投递租约时长（秒）
    pub lease_secs: u64,
}

impl WebhookSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 投递租约时长
    ///
    /// 不短于一次完整重试过程的最坏耗时，否则租约可能在投递途中过期并被重复认领。
    pub fn lease(&self) -> chrono::Duration {
        let configured = Duration::from_secs(self.lease_secs);
        let floor = RetryPolicy::from_settings(self)
            .worst_case_duration(self.timeout())
            .saturating_add(Duration::from_secs(LEASE_MARGIN_SECS));
        if configured < floor {
            warn!(
                lease_secs = self.lease_secs,
                floor_secs = floor.as_secs_f64(),
                "Webhook lease shorter than worst-case delivery, raising it"
            );
        }
        let lease = configured.max(floor);
        chrono::Duration::milliseconds(i64::try_from(lease.as_millis()).unwrap_or(i64::MAX))
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和 `ENRICHRS__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("ENRICHRS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 从 TOML 文本加载配置，未给出的项使用默认值
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("store.backend", "redis")?
            .set_default("store.key_prefix", "enrichment")?
            .set_default("store.max_mutate_retries", 64)?
            .set_default("queue.backend", "redis")?
            .set_default("queue.work_queue", "enrichment:work")?
            .set_default("queue.result_queue", "enrichment:results")?
            .set_default("queue.poll_timeout_secs", 5)?
            .set_default("queue.consumer_concurrency", 8)?
            // 2 小时处理时限，600 小时保留
            .set_default("task.deadline_secs", 7200)?
            .set_default("task.retention_secs", 2_160_000)?
            .set_default("task.sweep_interval_secs", 30)?
            .set_default("task.sweep_batch_size", 100)?
            .set_default("task.min_confidence_score", 50)?
            .set_default("webhook.max_attempts", 5)?
            .set_default("webhook.initial_backoff_ms", 1000)?
            .set_default("webhook.max_backoff_ms", 60_000)?
            .set_default("webhook.timeout_secs", 30)?
            .set_default("webhook.lease_secs", 600)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
