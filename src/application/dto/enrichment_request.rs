// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::task::CompanyRef;

/// 富化提交请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequestDto {
    /// 待调研的公司列表，按提交顺序处理
    #[validate(length(min = 1, message = "formData cannot be empty"), nested)]
    pub form_data: Vec<CompanyInputDto>,

    /// 最终结果投递地址，缺省时使用配置的默认地址
    #[validate(url)]
    pub webhook_url: Option<String>,
}

/// 单个公司输入
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInputDto {
    #[validate(length(min = 1, message = "companyName cannot be empty"))]
    pub company_name: String,
    pub company_id: i64,
}

impl From<CompanyInputDto> for CompanyRef {
    fn from(dto: CompanyInputDto) -> Self {
        CompanyRef {
            company_id: dto.company_id,
            company_name: dto.company_name,
        }
    }
}

/// 提交响应DTO
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentAcceptedDto {
    pub task_id: Uuid,
    pub status: String,
    pub num_companies: usize,
    /// 部分工作消息发布失败，未发布的条目将在截止时间后按超时处理
    pub degraded: bool,
}
