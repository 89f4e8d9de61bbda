// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含调度、聚合和查询用例以及数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含任务实体、任务仓库契约和领域服务
pub mod domain;

/// 基础设施模块
///
/// 提供 Redis、Webhook 投递和指标导出等外部集成
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 工作消息发布与结果回调接收
pub mod queue;

/// 工具模块
///
/// 提供错误类型、重试策略和日志初始化
pub mod utils;

/// 工作器模块
///
/// 实现结果消费、截止扫描、保留清理和通知
pub mod workers;
