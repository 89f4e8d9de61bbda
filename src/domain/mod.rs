// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：任务、条目、联系人与 Webhook 负载
/// - 仓库接口（repositories）：任务存储的原子变更契约
/// - 服务（services）：置信度过滤、终止通知和 Webhook 投递
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
