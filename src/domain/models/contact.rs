// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 联系人置信度下限
///
/// 置信度低于该值的联系人在合并前即被丢弃，不会出现在任何持久化或发出的结果中。
pub const MIN_CONFIDENCE_SCORE: u8 = 50;

/// 置信度上限
pub const MAX_CONFIDENCE_SCORE: u8 = 100;

/// 联系人实体
///
/// 单个调研结果单元。除置信度外的所有字段均为不透明字符串，原样透传。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// 名
    pub first_name: Option<String>,
    /// 姓
    pub last_name: Option<String>,
    /// 邮箱
    pub email: Option<String>,
    /// 电话
    pub phone: Option<String>,
    /// LinkedIn 主页
    pub linkedin_url: Option<String>,
    /// 职位
    pub role: Option<String>,
    /// 置信度（0-100）
    pub confidence_score: u8,
}

impl Contact {
    /// 是否满足最低置信度要求
    pub fn meets_threshold(&self, min_score: u8) -> bool {
        self.confidence_score >= min_score
    }
}
