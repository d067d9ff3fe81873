//! 出站线索载荷
//!
//! 发送给 CRM 采集端点（`POST /api/leads/capture/`）的 JSON 结构：
//! 表单字段 + 当前会话的归因记录 + 楼盘/活动上下文

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::attribution::AttributionRecord;

/// 楼盘/活动引用（调用方提供的只读上下文）
///
/// 采集子系统只透传，从不修改
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CampaignRef {
    #[serde(default)]
    pub property_slug: Option<String>,
    #[serde(default)]
    pub campaign_slug: Option<String>,
    #[serde(default)]
    pub property_title: Option<String>,
}

/// CRM 端点的请求体
///
/// 字段名与 CRM 侧约定保持 snake_case；空的可选字段不序列化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadPayload {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// E.164 格式（+91 前缀）
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_slug: Option<String>,
    pub source: String,
    /// 渐进式画像阶段（1-4）；单次表单提交时缺省
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_stage: Option<u8>,
    /// 提交前必须为 true（由验证层保证）
    pub consent_given: bool,
    /// 用户看到的授权声明原文
    pub consent_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
}

impl LeadPayload {
    /// 合并归因记录（空字段不写入载荷）
    pub fn with_attribution(mut self, attribution: &AttributionRecord) -> Self {
        fn non_empty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_string())
        }

        self.utm_source = non_empty(&attribution.utm_source);
        self.utm_medium = non_empty(&attribution.utm_medium);
        self.utm_campaign = non_empty(&attribution.utm_campaign);
        self.utm_content = non_empty(&attribution.utm_content);
        self.utm_term = non_empty(&attribution.utm_term);
        self
    }

    /// 附加楼盘/活动上下文
    pub fn with_campaign(mut self, campaign: &CampaignRef) -> Self {
        self.property_interest = campaign
            .property_title
            .clone()
            .or_else(|| campaign.property_slug.clone());
        self.campaign_slug = campaign.campaign_slug.clone();
        self
    }
}
