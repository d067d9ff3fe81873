//! 渐进式画像状态机
//!
//! 每次 continue 按当前阶段验证、合并草稿、投递"截至目前的草稿"
//! 并前移指针；back 只回移指针。推进只受本地验证门控，CRM 投递
//! 失败按软失败吸收（strict 模式除外）。到达 Complete 后状态机终结。

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use ts_rs::TS;

use super::draft::{LeadDraft, StageInput};
use super::stages::ProfileStage;
use crate::attribution::AttributionStore;
use crate::capture::{CampaignRef, CaptureSink, LeadJournal, LeadPayload};
use crate::errors::{LeadgateError, Result};
use crate::session::SessionRegistry;
use crate::validation::{
    ValidationReport, format_e164, validate_consent, validate_email, validate_name, validate_phone,
};
use crate::{publish_lead_captured, publish_stage_submitted};

/// 漏斗引擎的依赖集合（显式注入，便于测试替换）
#[derive(Clone)]
pub struct FunnelDeps {
    pub sink: Arc<dyn CaptureSink>,
    pub journal: Arc<LeadJournal>,
    pub sessions: Arc<SessionRegistry>,
    pub attribution: Arc<AttributionStore>,
    /// true 时投递失败向调用方传播且不推进阶段
    pub strict: bool,
    pub default_source: String,
}

/// continue 动作的结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum AdvanceOutcome {
    /// 验证通过，已推进到下一阶段
    Advanced {
        #[ts(type = "number")]
        stage: ProfileStage,
    },
    /// 最后一个阶段完成，漏斗终结
    Completed,
    /// 验证失败，停留在当前阶段
    Rejected { errors: HashMap<String, String> },
}

/// 单次表单提交的结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum SubmitOutcome {
    Accepted { lead_id: String },
    Rejected { errors: HashMap<String, String> },
}

/// 单次（非渐进）表单的完整字段
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SingleShotForm {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub consent_given: bool,
    pub consent_text: String,
}

/// 一个会话的渐进式画像向导
pub struct ProfileWizard {
    session_id: String,
    campaign: CampaignRef,
    page_url: Option<String>,
    source: String,
    stage: ProfileStage,
    completed: bool,
    draft: LeadDraft,
    /// 已投递过的最高阶段号；保证投递按阶段号单调不减
    last_submitted: u8,
}

impl ProfileWizard {
    pub fn new(
        session_id: &str,
        campaign: CampaignRef,
        page_url: Option<String>,
        source: String,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            campaign,
            page_url,
            source,
            stage: ProfileStage::Identity,
            completed: false,
            draft: LeadDraft::new(),
            last_submitted: 0,
        }
    }

    pub fn current_stage(&self) -> ProfileStage {
        self.stage
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn draft(&self) -> &LeadDraft {
        &self.draft
    }

    /// continue：验证当前阶段、合并草稿、投递、推进
    pub async fn advance(&mut self, input: StageInput, deps: &FunnelDeps) -> Result<AdvanceOutcome> {
        if self.completed {
            return Err(LeadgateError::funnel_closed(format!(
                "profile for session {} is already complete",
                self.session_id
            )));
        }

        if input.stage() != self.stage {
            return Err(LeadgateError::session_state(format!(
                "got input for stage {} while at stage {}",
                input.stage().number(),
                self.stage.number()
            )));
        }

        // 本地验证失败：停在当前阶段，返回字段错误
        let report = input.validate();
        if !report.is_ok() {
            debug!(
                "Stage {} validation failed for session {}: {} field error(s)",
                self.stage.number(),
                self.session_id,
                report.len()
            );
            return Ok(AdvanceOutcome::Rejected {
                errors: report.into_map(),
            });
        }

        self.draft.apply(&input);

        // 投递截至目前的草稿。back 之后重走较低阶段时不重复投递，
        // 保证同一草稿的投递阶段号单调不减
        if self.stage.number() > self.last_submitted {
            self.submit_partial(deps).await?;
            self.last_submitted = self.stage.number();
        }

        match self.stage.next() {
            Some(next) => {
                self.stage = next;
                Ok(AdvanceOutcome::Advanced { stage: next })
            }
            None => {
                self.completed = true;
                deps.sessions.mark_captured(&self.session_id);
                publish_lead_captured!(&self.session_id, &self.source);
                Ok(AdvanceOutcome::Completed)
            }
        }
    }

    /// back：只回移指针，不重新投递、不丢弃已填字段
    pub fn back(&mut self) -> Result<ProfileStage> {
        if self.completed {
            return Err(LeadgateError::funnel_closed(format!(
                "profile for session {} is already complete",
                self.session_id
            )));
        }

        if let Some(prev) = self.stage.prev() {
            self.stage = prev;
        }
        Ok(self.stage)
    }

    /// 投递当前草稿，带上阶段号
    async fn submit_partial(&self, deps: &FunnelDeps) -> Result<()> {
        // 验证层已保证授权；此处兜底，未授权的草稿绝不出网
        validate_consent(self.draft.consent_given)
            .map_err(|e| LeadgateError::consent_missing(e.to_string()))?;

        let payload = self.build_payload(deps);
        let stage = self.stage.number();

        let delivered = match deps.sink.deliver(&payload).await {
            Ok(()) => true,
            Err(e) if deps.strict => return Err(e),
            Err(e) => {
                // 软失败：投递故障对漏斗不可见，仅记日志
                warn!(
                    "Stage {} delivery failed for session {} (absorbed): {}",
                    stage, self.session_id, e
                );
                false
            }
        };

        deps.journal.append(&self.session_id, payload, delivered)?;

        // 任何一次受理的提交都会抑制该会话的后续自动弹层
        deps.sessions.mark_captured(&self.session_id);
        publish_stage_submitted!(&self.session_id, stage, &self.source);

        Ok(())
    }

    fn build_payload(&self, deps: &FunnelDeps) -> LeadPayload {
        let attribution = deps.attribution.stored(&self.session_id);

        LeadPayload {
            first_name: self.draft.first_name.clone().unwrap_or_default(),
            last_name: self.draft.last_name.clone(),
            phone: self
                .draft
                .phone
                .as_deref()
                .map(format_e164)
                .unwrap_or_default(),
            email: self.draft.email.clone(),
            property_interest: None,
            campaign_slug: None,
            source: self.source.clone(),
            profile_stage: Some(self.stage.number()),
            consent_given: self.draft.consent_given,
            consent_text: self.draft.consent_text.clone(),
            page_url: self.page_url.clone(),
            budget: self.draft.budget.clone(),
            buyer_status: self.draft.buyer_status.map(|s| s.to_string()),
            current_city: self.draft.current_city.clone(),
            specific_requirements: self.draft.specific_requirements.clone(),
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_content: None,
            utm_term: None,
        }
        .with_campaign(&self.campaign)
        .with_attribution(&attribution)
    }
}

/// 全部在途向导的管理器
///
/// 同一会话的动作经 tokio Mutex 串行化；不同会话互不阻塞
pub struct FunnelManager {
    deps: FunnelDeps,
    wizards: DashMap<String, Arc<Mutex<ProfileWizard>>>,
}

impl FunnelManager {
    pub fn new(deps: FunnelDeps) -> Self {
        Self {
            deps,
            wizards: DashMap::new(),
        }
    }

    pub fn deps(&self) -> &FunnelDeps {
        &self.deps
    }

    /// 向导 continue；首次调用时创建向导
    pub async fn advance(
        &self,
        session_id: &str,
        campaign: CampaignRef,
        page_url: Option<String>,
        source: Option<String>,
        input: StageInput,
    ) -> Result<AdvanceOutcome> {
        let wizard = self
            .wizards
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(ProfileWizard::new(
                    session_id,
                    campaign,
                    page_url,
                    source.unwrap_or_else(|| self.deps.default_source.clone()),
                )))
            })
            .clone();

        let mut wizard = wizard.lock().await;
        wizard.advance(input, &self.deps).await
    }

    /// 向导 back
    pub async fn back(&self, session_id: &str) -> Result<ProfileStage> {
        let wizard = self
            .wizards
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                LeadgateError::not_found(format!("no profile in progress for session {}", session_id))
            })?;

        let mut wizard = wizard.lock().await;
        wizard.back()
    }

    /// 当前阶段（无在途向导时 None）
    pub async fn stage_of(&self, session_id: &str) -> Option<ProfileStage> {
        let wizard = self
            .wizards
            .get(session_id)
            .map(|entry| entry.value().clone())?;
        let wizard = wizard.lock().await;
        (!wizard.is_complete()).then(|| wizard.current_stage())
    }

    /// 单次表单提交（英雄区表单、吸底条、弹层快捕）
    ///
    /// 验证全部必填字段；受理后投递（软失败）并置会话捕获标记
    pub async fn submit_single_shot(
        &self,
        session_id: &str,
        campaign: CampaignRef,
        page_url: Option<String>,
        source: Option<String>,
        form: SingleShotForm,
    ) -> Result<SubmitOutcome> {
        let mut report = ValidationReport::new();
        report.check(validate_name(&form.first_name));
        report.check(validate_phone(&form.phone));
        if let Some(email) = form.email.as_deref().filter(|e| !e.trim().is_empty()) {
            report.check(validate_email(email));
        }
        report.check(validate_consent(form.consent_given));

        if !report.is_ok() {
            return Ok(SubmitOutcome::Rejected {
                errors: report.into_map(),
            });
        }

        let source = source.unwrap_or_else(|| self.deps.default_source.clone());
        let attribution = self.deps.attribution.stored(session_id);

        let payload = LeadPayload {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.clone(),
            phone: format_e164(&form.phone),
            email: form.email.clone(),
            property_interest: None,
            campaign_slug: None,
            source: source.clone(),
            profile_stage: None,
            consent_given: form.consent_given,
            consent_text: form.consent_text.clone(),
            page_url,
            budget: None,
            buyer_status: None,
            current_city: None,
            specific_requirements: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_content: None,
            utm_term: None,
        }
        .with_campaign(&campaign)
        .with_attribution(&attribution);

        let delivered = match self.deps.sink.deliver(&payload).await {
            Ok(()) => true,
            Err(e) if self.deps.strict => return Err(e),
            Err(e) => {
                // 软失败：用户侧永远是成功态
                warn!(
                    "Single-shot delivery failed for session {} (absorbed): {}",
                    session_id, e
                );
                false
            }
        };

        let lead = self.deps.journal.append(session_id, payload, delivered)?;
        self.deps.sessions.mark_captured(session_id);
        publish_lead_captured!(session_id, &source);

        Ok(SubmitOutcome::Accepted { lead_id: lead.id })
    }
}
