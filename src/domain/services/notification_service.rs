// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use uuid::Uuid;

/// 任务终止通知特质
///
/// 任务状态变为完成或超时后，聚合器与截止时间扫描通过它触发最终结果投递。
/// 实现必须是幂等的：同一任务被多次触发时最多投递一次。
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    /// 任务已进入可通知的终止状态
    async fn task_finished(&self, task_id: Uuid);
}
