// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台任务处理和工作器管理功能
/// 包括结果消费、截止扫描、保留清理和 Webhook 通知
pub mod deadline_worker;
pub mod manager;
pub mod notifier;
pub mod result_worker;
pub mod retention_worker;
pub mod worker;

pub use worker::Worker;
