// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::task::{Task, TaskState};
use crate::domain::models::webhook::CompanyResult;

/// 任务状态视图
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusDto {
    pub task_id: Uuid,
    pub state: TaskState,
    pub items_total: usize,
    pub items_received: usize,
    pub created_at: DateTime<Utc>,
    pub deadline_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notified_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl From<&Task> for TaskStatusDto {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            state: task.state,
            items_total: task.items_total(),
            items_received: task.items_received(),
            created_at: task.created_at,
            deadline_at: task.deadline_at,
            completed_at: task.completed_at,
            notified_at: task.notified_at,
            last_error: task.last_error.clone(),
        }
    }
}

/// 任务结果视图
///
/// 与 Webhook 负载结构一致，额外携带当前状态；任务未完成时结果可能不完整。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResultsDto {
    pub task_id: Uuid,
    pub state: TaskState,
    pub results: Vec<CompanyResult>,
}

impl From<&Task> for TaskResultsDto {
    fn from(task: &Task) -> Self {
        let payload = task.to_payload();
        Self {
            task_id: payload.task_id,
            state: task.state,
            results: payload.results,
        }
    }
}
