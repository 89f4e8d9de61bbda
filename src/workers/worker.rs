// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// 后台工作器
///
/// 结果消费、截止扫描和保留清理都实现此 trait，由 [`WorkerManager`] 统一启动。
/// `run` 正常情况下不会返回，只有遇到无法继续的错误时才返回 `Err`。
///
/// [`WorkerManager`]: crate::workers::manager::WorkerManager
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器循环
    async fn run(&self) -> Result<(), WorkerError>;

    /// 工作器名称，用于日志
    fn name(&self) -> &str;
}
