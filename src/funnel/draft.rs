//! 线索草稿与阶段输入
//!
//! 草稿跨阶段累积：后续阶段只补充字段，已知字段永不丢失。
//! 每个阶段的输入是带判别标签的独立变体，必填字段由类型保证。

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use ts_rs::TS;

use super::stages::ProfileStage;
use crate::validation::{
    ValidationReport, validate_consent, validate_email, validate_name, validate_phone,
};

/// 购房者身份
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, TS,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[ts(export)]
pub enum BuyerStatus {
    Buyer,
    Investor,
    Renter,
    Nri,
}

/// 单个阶段的表单输入（判别联合，阶段字段编译期受检）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "stage", rename_all = "snake_case")]
#[ts(export)]
pub enum StageInput {
    /// 阶段 1：身份与授权
    Identity {
        first_name: String,
        #[serde(default)]
        last_name: Option<String>,
        #[serde(default)]
        email: Option<String>,
        consent_given: bool,
        /// 页面上展示给用户的授权声明原文
        consent_text: String,
    },
    /// 阶段 2：联系方式
    Contact {
        phone: String,
        #[serde(default)]
        email: Option<String>,
    },
    /// 阶段 3：预算与城市
    BudgetLocation {
        #[serde(default)]
        budget: Option<String>,
        #[serde(default)]
        buyer_status: Option<BuyerStatus>,
        #[serde(default)]
        current_city: Option<String>,
    },
    /// 阶段 4：具体需求
    Requirements {
        #[serde(default)]
        specific_requirements: Option<String>,
    },
}

impl StageInput {
    /// 输入对应的阶段
    pub fn stage(&self) -> ProfileStage {
        match self {
            Self::Identity { .. } => ProfileStage::Identity,
            Self::Contact { .. } => ProfileStage::Contact,
            Self::BudgetLocation { .. } => ProfileStage::BudgetLocation,
            Self::Requirements { .. } => ProfileStage::Requirements,
        }
    }

    /// 运行该阶段的验证子集
    ///
    /// 邮箱仅在填写时校验（本漏斗中邮箱不是必填项）
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        match self {
            Self::Identity {
                first_name,
                email,
                consent_given,
                ..
            } => {
                report.check(validate_name(first_name));
                if let Some(email) = email.as_deref().filter(|e| !e.trim().is_empty()) {
                    report.check(validate_email(email));
                }
                report.check(validate_consent(*consent_given));
            }
            Self::Contact { phone, email } => {
                report.check(validate_phone(phone));
                if let Some(email) = email.as_deref().filter(|e| !e.trim().is_empty()) {
                    report.check(validate_email(email));
                }
            }
            // 阶段 3/4 为尽力收集：枚举由类型保证，其余字段可缺省
            Self::BudgetLocation { .. } | Self::Requirements { .. } => {}
        }

        report
    }
}

/// 跨阶段累积的线索草稿
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub budget: Option<String>,
    pub buyer_status: Option<BuyerStatus>,
    pub current_city: Option<String>,
    pub specific_requirements: Option<String>,
    pub consent_given: bool,
    pub consent_text: String,
}

impl LeadDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一个阶段的输入
    ///
    /// 只写入新提供的值；输入中缺省的字段保留草稿原值
    pub fn apply(&mut self, input: &StageInput) {
        fn keep_or(existing: &mut Option<String>, incoming: &Option<String>) {
            if let Some(value) = incoming.as_deref().filter(|v| !v.trim().is_empty()) {
                *existing = Some(value.to_string());
            }
        }

        match input {
            StageInput::Identity {
                first_name,
                last_name,
                email,
                consent_given,
                consent_text,
            } => {
                self.first_name = Some(first_name.clone());
                keep_or(&mut self.last_name, last_name);
                keep_or(&mut self.email, email);
                self.consent_given = *consent_given;
                self.consent_text = consent_text.clone();
            }
            StageInput::Contact { phone, email } => {
                self.phone = Some(phone.clone());
                keep_or(&mut self.email, email);
            }
            StageInput::BudgetLocation {
                budget,
                buyer_status,
                current_city,
            } => {
                keep_or(&mut self.budget, budget);
                if let Some(status) = buyer_status {
                    self.buyer_status = Some(*status);
                }
                keep_or(&mut self.current_city, current_city);
            }
            StageInput::Requirements {
                specific_requirements,
            } => {
                keep_or(&mut self.specific_requirements, specific_requirements);
            }
        }
    }

    /// 已填字段数（用于断言阶段间字段集单调不减）
    pub fn known_field_count(&self) -> usize {
        [
            self.first_name.is_some(),
            self.last_name.is_some(),
            self.phone.is_some(),
            self.email.is_some(),
            self.budget.is_some(),
            self.buyer_status.is_some(),
            self.current_city.is_some(),
            self.specific_requirements.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}
