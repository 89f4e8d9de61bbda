// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含不属于单个实体的业务规则：
/// - 置信度过滤（contact_filter）
/// - 终止通知（notification_service）
/// - Webhook投递（webhook_service）
pub mod contact_filter;
pub mod notification_service;
pub mod webhook_service;
