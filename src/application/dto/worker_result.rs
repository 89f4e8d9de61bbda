// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::models::contact::{Contact, MAX_CONFIDENCE_SCORE};
use crate::utils::errors::EnrichmentError;

/// Worker 回调DTO
///
/// 支持两种形式：扁平的 `{taskId, companyId, companyName, contacts, error}`，
/// 以及把结果包在 `data` 中的 `{task_id, data: {...}, error}`。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResultDto {
    #[serde(alias = "task_id")]
    pub task_id: Uuid,
    #[serde(default, alias = "company_id")]
    pub company_id: Option<i64>,
    #[serde(default, alias = "company_name")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contacts: Option<Vec<ContactDto>>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub data: Option<WorkerResultBody>,
}

/// 包裹形式中的结果主体
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResultBody {
    #[serde(default, alias = "company_id")]
    pub company_id: Option<i64>,
    #[serde(default, alias = "company_name")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contacts: Option<Vec<ContactDto>>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Worker 上报的联系人
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    #[serde(default)]
    pub first_name: Option<FieldValue>,
    #[serde(default)]
    pub last_name: Option<FieldValue>,
    #[serde(default)]
    pub email: Option<FieldValue>,
    #[serde(default)]
    pub phone: Option<FieldValue>,
    #[serde(default)]
    pub linkedin_url: Option<FieldValue>,
    #[serde(default)]
    pub role: Option<FieldValue>,
    pub confidence_score: i64,
}

/// 联系人字段值：纯字符串或带来源的对象
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Plain(String),
    Detailed {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        sources: Vec<Value>,
        #[serde(default)]
        confidence: Option<f64>,
    },
}

impl FieldValue {
    /// 展平为存储和输出使用的字符串
    pub fn into_value(self) -> Option<String> {
        match self {
            FieldValue::Plain(value) => Some(value),
            FieldValue::Detailed { value, .. } => value,
        }
    }
}

fn flatten(field: Option<FieldValue>) -> Option<String> {
    field.and_then(FieldValue::into_value)
}

impl ContactDto {
    /// 转换为领域联系人，置信度须在 0-100 之间
    pub fn into_contact(self) -> Result<Contact, EnrichmentError> {
        let confidence_score = u8::try_from(self.confidence_score)
            .ok()
            .filter(|score| *score <= MAX_CONFIDENCE_SCORE)
            .ok_or_else(|| {
                EnrichmentError::InvalidResult(format!(
                    "confidenceScore out of range: {}",
                    self.confidence_score
                ))
            })?;

        Ok(Contact {
            first_name: flatten(self.first_name),
            last_name: flatten(self.last_name),
            email: flatten(self.email),
            phone: flatten(self.phone),
            linkedin_url: flatten(self.linkedin_url),
            role: flatten(self.role),
            confidence_score,
        })
    }
}

/// 规范化后的 Worker 结果
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerResult {
    pub task_id: Uuid,
    pub company_id: i64,
    pub company_name: Option<String>,
    /// 未过滤的联系人
    pub contacts: Vec<Contact>,
    pub error: Option<String>,
}

impl WorkerResultDto {
    /// 从原始 JSON 文本解析
    pub fn parse(raw: &str) -> Result<Self, EnrichmentError> {
        serde_json::from_str(raw).map_err(|e| EnrichmentError::InvalidResult(e.to_string()))
    }

    /// 校验并规范化为 [`WorkerResult`]
    ///
    /// 缺少 companyId、既无 contacts 也无 error、或任一联系人置信度越界时返回 `InvalidResult`。
    pub fn into_result(self) -> Result<WorkerResult, EnrichmentError> {
        let body = self.data;
        let company_id = self
            .company_id
            .or(body.as_ref().and_then(|b| b.company_id))
            .ok_or_else(|| EnrichmentError::InvalidResult("missing companyId".to_string()))?;
        let company_name = self
            .company_name
            .or_else(|| body.as_ref().and_then(|b| b.company_name.clone()));
        let error = self
            .error
            .or_else(|| body.as_ref().and_then(|b| b.error.clone()))
            .filter(|e| !e.is_null())
            .map(error_message);
        let contacts = self.contacts.or(body.and_then(|b| b.contacts));

        let contacts = match (contacts, &error) {
            (Some(contacts), _) => contacts
                .into_iter()
                .map(ContactDto::into_contact)
                .collect::<Result<Vec<_>, _>>()?,
            (None, Some(_)) => Vec::new(),
            (None, None) => {
                return Err(EnrichmentError::InvalidResult(
                    "missing contacts".to_string(),
                ))
            }
        };

        Ok(WorkerResult {
            task_id: self.task_id,
            company_id,
            company_name,
            contacts,
            error,
        })
    }
}

fn error_message(error: Value) -> String {
    match error {
        Value::String(message) => message,
        Value::Object(ref map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "worker_result_test.rs"]
mod tests;
