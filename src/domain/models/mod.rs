// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 联系人（contact）：单个调研结果单元
/// - 任务（task）：一次提交的批次及其条目状态
/// - 网络钩子（webhook）：投递给调用方的最终结果负载
pub mod contact;
pub mod task;
pub mod webhook;
