// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供工作消息发布与结果回调接收
/// 支持 Redis 列表与进程内两种后端
pub mod memory_queue;
pub mod message;
pub mod redis_queue;
pub mod work_queue;
