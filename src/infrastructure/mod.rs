// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - 缓存（cache）：Redis 客户端
/// - 指标（metrics）：Prometheus 导出与指标名称
/// - 仓库实现（repositories）：任务仓库的 Redis 与内存实现
/// - 服务（services）：Webhook 投递
///
/// 基础设施层依赖于领域层的抽象接口。
pub mod cache;
pub mod metrics;
pub mod repositories;
pub mod services;
