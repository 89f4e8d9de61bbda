// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供任务仓库接口的具体实现
/// 包括 Redis 实现和进程内实现
pub mod memory_task_repo_impl;
pub mod redis_task_repo_impl;
