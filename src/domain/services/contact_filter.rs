// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::contact::{Contact, MIN_CONFIDENCE_SCORE};
use tracing::warn;

/// 置信度过滤器
///
/// 在结果合并之前丢弃低置信度联系人。阈值可以配置得更严格，
/// 但不会低于 [`MIN_CONFIDENCE_SCORE`]。
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceFilter {
    min_score: u8,
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self {
            min_score: MIN_CONFIDENCE_SCORE,
        }
    }
}

impl ConfidenceFilter {
    /// 创建新的过滤器
    ///
    /// # 参数
    ///
    /// * `min_score` - 最低置信度，低于全局下限时使用全局下限
    pub fn new(min_score: u8) -> Self {
        if min_score < MIN_CONFIDENCE_SCORE {
            warn!(
                "Configured confidence threshold {} is below the floor, using {}",
                min_score, MIN_CONFIDENCE_SCORE
            );
        }
        Self {
            min_score: min_score.max(MIN_CONFIDENCE_SCORE),
        }
    }

    /// 当前生效的阈值
    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    /// 过滤联系人，保留原有顺序
    pub fn apply(&self, contacts: Vec<Contact>) -> Vec<Contact> {
        contacts
            .into_iter()
            .filter(|contact| contact.meets_threshold(self.min_score))
            .collect()
    }
}
