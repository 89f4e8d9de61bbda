// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contact::Contact;

/// Webhook负载
///
/// 任务终止后投递给调用方的最终聚合结果，也是结果查询接口返回的数据形状。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// 任务ID
    pub task_id: Uuid,
    /// 各公司的结果，顺序与提交顺序一致
    pub results: Vec<CompanyResult>,
}

/// 单个公司的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResult {
    /// 公司ID
    pub company_id: i64,
    /// 公司名称
    pub company_name: String,
    /// 置信度不低于阈值的联系人
    pub contacts: Vec<Contact>,
    /// Worker 上报的错误信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookPayload {
    /// 已有联系人的公司数量
    pub fn companies_with_contacts(&self) -> usize {
        self.results
            .iter()
            .filter(|result| !result.contacts.is_empty())
            .count()
    }
}
