// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::contact::Contact;
use super::webhook::{CompanyResult, WebhookPayload};

/// 任务实体
///
/// 表示一次提交的公司批次及其聚合生命周期。`items` 在创建时固定，
/// 之后只会更新其中条目的状态和联系人，不会增删。
///
/// 所有状态变更都通过本类型上的方法完成，这些方法是纯函数式的
/// 折叠步骤：给定相同的输入重复执行得到相同的结果，因此可以在
/// 存储层的乐观重试中安全地重放。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务状态
    pub state: TaskState,
    /// 最终结果的投递地址
    pub webhook_url: String,
    /// 条目列表，按提交顺序排列
    pub items: Vec<ItemRecord>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 截止时间，创建时根据最大处理窗口确定
    pub deadline_at: DateTime<Utc>,
    /// 进入终止状态（完成或超时）的时间
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Webhook 成功投递的时间，存在即表示已通知
    #[serde(default)]
    pub notified_at: Option<DateTime<Utc>>,
    /// 当前持有的投递租约
    #[serde(default)]
    pub delivery_lease: Option<DeliveryLease>,
    /// 已尝试投递的次数
    #[serde(default)]
    pub delivery_attempts: u32,
    /// 最近一次投递失败的错误信息
    #[serde(default)]
    pub last_error: Option<String>,
    /// 乐观并发控制版本号，由存储层维护
    #[serde(default)]
    pub version: u64,
}

/// 条目记录
///
/// 任务中的单个公司，作为一个独立工作单元被分发。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// 调用方提供的公司ID
    pub company_id: i64,
    /// 调用方提供的公司名称
    pub company_name: String,
    /// 条目状态
    pub status: ItemStatus,
    /// 已过滤的联系人列表，结果到达前为空
    #[serde(default)]
    pub contacts: Vec<Contact>,
    /// Worker 上报的错误信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 投递租约
///
/// 通知器在发送前获取租约，只有持有租约的一方才能发送 Webhook。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLease {
    /// 租约令牌
    pub token: Uuid,
    /// 租约过期时间
    pub expires_at: DateTime<Utc>,
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Queued → Processing → Partial → Completed/TimedOut → (投递失败时) Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// 已持久化，工作消息尚未发布
    #[default]
    Queued,
    /// 工作消息已发布，尚未收到任何结果
    Processing,
    /// 已收到部分结果
    Partial,
    /// 所有条目均已收到结果
    Completed,
    /// Webhook 投递在重试耗尽后仍然失败
    Failed,
    /// 截止时间已过，部分结果被保留
    TimedOut,
}

impl TaskState {
    /// 是否为终止状态
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::TimedOut
        )
    }

    /// 是否需要向调用方投递最终结果
    pub fn is_notifiable(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::TimedOut)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskState::Queued => write!(f, "queued"),
            TaskState::Processing => write!(f, "processing"),
            TaskState::Partial => write!(f, "partial"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// 条目状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// 等待结果
    #[default]
    Pending,
    /// 已收到结果
    Received,
}

/// 合并结果
///
/// 描述一次 Worker 回调对任务产生的影响。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// 结果已合并；`completed` 表示本次合并使任务进入完成状态
    Merged { completed: bool },
    /// 匹配的条目均已收到结果，视为重复投递
    Duplicate,
    /// 任务中没有该公司ID对应的条目
    UnknownItem,
    /// 任务已处于终止状态
    Terminal,
    /// 已过截止时间，等待截止扫描处理
    Expired,
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 新任务中的公司条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRef {
    pub company_id: i64,
    pub company_name: String,
}

impl Task {
    /// 创建一个新的任务
    ///
    /// # 参数
    ///
    /// * `webhook_url` - 最终结果的投递地址
    /// * `companies` - 按提交顺序排列的公司列表，不能为空
    /// * `now` - 当前时间
    /// * `processing_window` - 最大处理窗口，用于计算截止时间
    ///
    /// # 返回值
    ///
    /// * `Ok(Task)` - 状态为 Queued 的新任务
    /// * `Err(DomainError)` - 公司列表为空
    pub fn new(
        webhook_url: String,
        companies: Vec<CompanyRef>,
        now: DateTime<Utc>,
        processing_window: Duration,
    ) -> Result<Self, DomainError> {
        if companies.is_empty() {
            return Err(DomainError::ValidationError(
                "formData cannot be empty".to_string(),
            ));
        }

        let items = companies
            .into_iter()
            .map(|company| ItemRecord {
                company_id: company.company_id,
                company_name: company.company_name,
                status: ItemStatus::Pending,
                contacts: Vec::new(),
                error: None,
            })
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            state: TaskState::Queued,
            webhook_url,
            items,
            created_at: now,
            deadline_at: now + processing_window,
            completed_at: None,
            notified_at: None,
            delivery_lease: None,
            delivery_attempts: 0,
            last_error: None,
            version: 0,
        })
    }

    /// 是否处于终止状态
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// 是否已结清：已成功通知或已最终失败
    ///
    /// 已结清的任务不再需要截止时间扫描或通知器处理。
    pub fn is_settled(&self) -> bool {
        self.notified_at.is_some() || self.state == TaskState::Failed
    }

    /// 是否已过截止时间
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline_at
    }

    /// 记录可以被淘汰的时间
    ///
    /// 已结清的任务从结清时刻起保留 `retention`；未结清的任务至少保留到
    /// 截止时间之后再加 `retention`。
    pub fn retain_until(&self, retention: Duration) -> DateTime<Utc> {
        if self.is_settled() {
            let settled_at = self
                .notified_at
                .or(self.completed_at)
                .unwrap_or(self.created_at);
            settled_at + retention
        } else {
            self.deadline_at + retention
        }
    }

    /// 条目总数
    pub fn items_total(&self) -> usize {
        self.items.len()
    }

    /// 已收到结果的条目数
    pub fn items_received(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::Received)
            .count()
    }

    /// 标记工作消息已发布
    ///
    /// 仅在 Queued 状态下生效，将任务推进到 Processing。
    ///
    /// # 返回值
    ///
    /// 状态是否发生变化
    pub fn mark_dispatched(&mut self) -> bool {
        if self.state != TaskState::Queued {
            return false;
        }
        self.state = TaskState::Processing;
        true
    }

    /// 合并一个 Worker 结果
    ///
    /// 已过截止时间的任务不再接受结果。
    /// 在条目列表中查找第一个仍处于 Pending 状态且公司ID匹配的条目，
    /// 写入联系人并标记为 Received，随后根据全部条目重新计算任务状态。
    /// 联系人必须已经过置信度过滤。
    ///
    /// # 参数
    ///
    /// * `company_id` - 公司ID
    /// * `contacts` - 已过滤的联系人列表
    /// * `error` - Worker 上报的错误信息
    /// * `now` - 当前时间
    ///
    /// # 返回值
    ///
    /// 合并结果，见 [`MergeOutcome`]
    pub fn apply_result(
        &mut self,
        company_id: i64,
        contacts: Vec<Contact>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> MergeOutcome {
        if self.is_terminal() {
            return MergeOutcome::Terminal;
        }

        // 截止后到达的结果不再合并，由截止扫描转为 TimedOut
        if self.is_overdue(now) {
            return MergeOutcome::Expired;
        }

        if !self.items.iter().any(|item| item.company_id == company_id) {
            return MergeOutcome::UnknownItem;
        }

        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.company_id == company_id && item.status == ItemStatus::Pending)
        else {
            return MergeOutcome::Duplicate;
        };

        item.contacts = contacts;
        item.error = error;
        item.status = ItemStatus::Received;

        let completed = self.refresh_state(now);
        MergeOutcome::Merged { completed }
    }

    /// 根据条目集合重新计算状态
    ///
    /// 完成判断只依赖当前的条目集合，重放安全。
    fn refresh_state(&mut self, now: DateTime<Utc>) -> bool {
        if self.items_received() == self.items_total() {
            self.state = TaskState::Completed;
            self.completed_at = Some(now);
            true
        } else {
            self.state = TaskState::Partial;
            false
        }
    }

    /// 截止时间到期处理
    ///
    /// 仅当任务已过截止时间且尚未终止时，转换为 TimedOut；
    /// 已到达的条目保留在聚合结果中。
    ///
    /// # 返回值
    ///
    /// 状态是否发生变化
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_terminal() || !self.is_overdue(now) {
            return false;
        }
        self.state = TaskState::TimedOut;
        self.completed_at = Some(now);
        true
    }

    /// 获取投递租约
    ///
    /// 只有可通知、尚未通知且没有有效租约的任务才能获取租约。
    ///
    /// # 参数
    ///
    /// * `token` - 本次投递的令牌
    /// * `now` - 当前时间
    /// * `lease` - 租约时长
    ///
    /// # 返回值
    ///
    /// 是否成功获取租约
    pub fn claim_delivery(&mut self, token: Uuid, now: DateTime<Utc>, lease: Duration) -> bool {
        if !self.state.is_notifiable() || self.notified_at.is_some() {
            return false;
        }
        if let Some(existing) = &self.delivery_lease {
            if existing.expires_at > now {
                return false;
            }
        }
        self.delivery_lease = Some(DeliveryLease {
            token,
            expires_at: now + lease,
        });
        true
    }

    /// 记录投递成功
    ///
    /// 仅当租约令牌仍然匹配时设置 `notified_at`，保证最多设置一次。
    pub fn record_delivered(&mut self, token: Uuid, attempts: u32, now: DateTime<Utc>) -> bool {
        if !self.holds_lease(token) || self.notified_at.is_some() {
            return false;
        }
        self.notified_at = Some(now);
        self.delivery_attempts = attempts;
        self.delivery_lease = None;
        self.last_error = None;
        true
    }

    /// 记录投递最终失败
    ///
    /// 重试耗尽后任务进入 Failed 状态，错误信息对查询接口可见。
    pub fn record_delivery_failure(&mut self, token: Uuid, attempts: u32, error: String) -> bool {
        if !self.holds_lease(token) || self.notified_at.is_some() {
            return false;
        }
        self.state = TaskState::Failed;
        self.delivery_attempts = attempts;
        self.delivery_lease = None;
        self.last_error = Some(error);
        true
    }

    fn holds_lease(&self, token: Uuid) -> bool {
        self.delivery_lease
            .as_ref()
            .is_some_and(|lease| lease.token == token)
    }

    /// 构建 Webhook 负载
    ///
    /// 条目顺序与提交顺序一致，联系人已经过滤。
    pub fn to_payload(&self) -> WebhookPayload {
        WebhookPayload {
            task_id: self.id,
            results: self
                .items
                .iter()
                .map(|item| CompanyResult {
                    company_id: item.company_id,
                    company_name: item.company_name.clone(),
                    contacts: item.contacts.clone(),
                    error: item.error.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "task_test.rs"]
mod tests;
