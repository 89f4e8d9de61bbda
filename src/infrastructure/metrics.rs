// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 已创建的任务数
pub const TASKS_CREATED: &str = "enrichment_tasks_created_total";
/// 发布失败的工作消息数
pub const WORK_PUBLISH_FAILURES: &str = "enrichment_work_publish_failures_total";
/// 已合并的结果数
pub const RESULTS_MERGED: &str = "enrichment_results_merged_total";
/// 被忽略的结果数（重复、未知或任务已终止）
pub const RESULTS_IGNORED: &str = "enrichment_results_ignored_total";
/// 任务不存在或已淘汰的结果数
pub const RESULTS_ORPHANED: &str = "enrichment_results_orphaned_total";
/// 无法解析的结果数
pub const RESULTS_REJECTED: &str = "enrichment_results_rejected_total";
/// 全部条目到齐的任务数
pub const TASKS_COMPLETED: &str = "enrichment_tasks_completed_total";
/// 超时的任务数
pub const TASKS_TIMED_OUT: &str = "enrichment_tasks_timed_out_total";
/// 成功投递的 Webhook 数
pub const WEBHOOKS_DELIVERED: &str = "enrichment_webhooks_delivered_total";
/// Webhook 投递尝试次数
pub const WEBHOOK_ATTEMPTS: &str = "enrichment_webhook_attempts_total";
/// 最终失败的 Webhook 数
pub const WEBHOOKS_FAILED: &str = "enrichment_webhooks_failed_total";

/// 初始化指标系统
///
/// 启动 Prometheus 导出端并注册指标描述；地址被占用时只记录警告
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!(TASKS_CREATED, "Total number of enrichment tasks accepted");
    describe_counter!(
        WORK_PUBLISH_FAILURES,
        "Total number of work messages that could not be published"
    );
    describe_counter!(RESULTS_MERGED, "Total number of worker results merged");
    describe_counter!(
        RESULTS_IGNORED,
        "Total number of duplicate or late worker results"
    );
    describe_counter!(
        RESULTS_ORPHANED,
        "Total number of worker results for unknown or evicted tasks"
    );
    describe_counter!(RESULTS_REJECTED, "Total number of malformed worker results");
    describe_counter!(
        TASKS_COMPLETED,
        "Total number of tasks that received every result"
    );
    describe_counter!(TASKS_TIMED_OUT, "Total number of tasks that hit their deadline");
    describe_counter!(WEBHOOK_ATTEMPTS, "Total number of webhook delivery attempts");
    describe_counter!(WEBHOOKS_DELIVERED, "Total number of webhooks delivered");
    describe_counter!(
        WEBHOOKS_FAILED,
        "Total number of webhooks that failed after all retries"
    );

    info!("Metrics exporter listening on {}", addr);
}
