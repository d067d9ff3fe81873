use std::sync::Arc;

use leadgate::attribution::{AttributionStore, extract_utm};
use leadgate::capture::{CampaignRef, LeadJournal, MemorySink};
use leadgate::errors::LeadgateError;
use leadgate::funnel::{
    AdvanceOutcome, BuyerStatus, FunnelDeps, FunnelManager, ProfileStage, SingleShotForm,
    StageInput, SubmitOutcome,
};
use leadgate::session::SessionRegistry;

const CONSENT_TEXT: &str = "I authorise Veridian Estates to contact me about this project.";

struct Harness {
    manager: FunnelManager,
    sink: Arc<MemorySink>,
    journal: Arc<LeadJournal>,
    sessions: Arc<SessionRegistry>,
    attribution: Arc<AttributionStore>,
}

fn harness(strict: bool) -> Harness {
    let sink = MemorySink::new();
    let journal = Arc::new(LeadJournal::in_memory());
    let sessions = Arc::new(SessionRegistry::new());
    let attribution = Arc::new(AttributionStore::in_memory());

    let manager = FunnelManager::new(FunnelDeps {
        sink: sink.clone(),
        journal: journal.clone(),
        sessions: sessions.clone(),
        attribution: attribution.clone(),
        strict,
        default_source: "website".to_string(),
    });

    Harness {
        manager,
        sink,
        journal,
        sessions,
        attribution,
    }
}

fn identity_input() -> StageInput {
    StageInput::Identity {
        first_name: "Amit".to_string(),
        last_name: None,
        email: Some("amit@x.com".to_string()),
        consent_given: true,
        consent_text: CONSENT_TEXT.to_string(),
    }
}

fn contact_input() -> StageInput {
    StageInput::Contact {
        phone: "9876543210".to_string(),
        email: None,
    }
}

fn budget_input() -> StageInput {
    StageInput::BudgetLocation {
        budget: Some("1.5cr-2cr".to_string()),
        buyer_status: Some(BuyerStatus::Buyer),
        current_city: Some("Gurgaon".to_string()),
    }
}

fn requirements_input() -> StageInput {
    StageInput::Requirements {
        specific_requirements: Some("3BHK, park facing".to_string()),
    }
}

async fn advance(h: &Harness, session: &str, input: StageInput) -> AdvanceOutcome {
    h.manager
        .advance(session, CampaignRef::default(), None, None, input)
        .await
        .expect("advance should not error in soft-fail mode")
}

#[cfg(test)]
mod wizard_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_progression_submits_every_stage() {
        let h = harness(false);

        assert!(matches!(
            advance(&h, "s1", identity_input()).await,
            AdvanceOutcome::Advanced {
                stage: ProfileStage::Contact
            }
        ));
        assert!(matches!(
            advance(&h, "s1", contact_input()).await,
            AdvanceOutcome::Advanced {
                stage: ProfileStage::BudgetLocation
            }
        ));
        assert!(matches!(
            advance(&h, "s1", budget_input()).await,
            AdvanceOutcome::Advanced {
                stage: ProfileStage::Requirements
            }
        ));
        assert!(matches!(
            advance(&h, "s1", requirements_input()).await,
            AdvanceOutcome::Completed
        ));

        // 每个阶段一次投递，阶段号单调不减
        let delivered = h.sink.delivered();
        let stages: Vec<Option<u8>> = delivered.iter().map(|p| p.profile_stage).collect();
        assert_eq!(stages, vec![Some(1), Some(2), Some(3), Some(4)]);

        // 完成后会话进入捕获态
        assert!(h.sessions.is_captured("s1"));
    }

    #[tokio::test]
    async fn test_partial_capture_on_dropoff() {
        let h = harness(false);

        // 只完成阶段 1，随后放弃
        advance(&h, "s1", identity_input()).await;

        // 阶段 1 的部分画像必须已经发出
        let delivered = h.sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].first_name, "Amit");
        assert_eq!(delivered[0].email.as_deref(), Some("amit@x.com"));
        assert_eq!(delivered[0].profile_stage, Some(1));
        // 阶段 1 还没有手机号
        assert!(delivered[0].phone.is_empty());
    }

    #[tokio::test]
    async fn test_fields_carry_forward_into_later_payloads() {
        let h = harness(false);

        advance(&h, "s1", identity_input()).await;
        advance(&h, "s1", contact_input()).await;

        let delivered = h.sink.delivered();
        let stage2 = &delivered[1];
        // 阶段 1 的字段出现在阶段 2 的载荷里
        assert_eq!(stage2.first_name, "Amit");
        assert_eq!(stage2.email.as_deref(), Some("amit@x.com"));
        assert_eq!(stage2.phone, "+919876543210");
    }

    #[tokio::test]
    async fn test_validation_failure_blocks_stage() {
        let h = harness(false);

        let outcome = advance(
            &h,
            "s1",
            StageInput::Identity {
                first_name: "A".to_string(),
                last_name: None,
                email: None,
                consent_given: false,
                consent_text: String::new(),
            },
        )
        .await;

        let AdvanceOutcome::Rejected { errors } = outcome else {
            panic!("expected rejection");
        };
        assert!(errors.contains_key("first_name"));
        assert!(errors.contains_key("consent"));

        // 没有投递，没有日志，没有捕获标记
        assert_eq!(h.sink.delivered_count(), 0);
        assert!(h.journal.is_empty());
        assert!(!h.sessions.is_captured("s1"));

        // 修正后可以推进
        assert!(matches!(
            advance(&h, "s1", identity_input()).await,
            AdvanceOutcome::Advanced { .. }
        ));
    }

    #[tokio::test]
    async fn test_soft_fail_still_advances() {
        let h = harness(false);
        h.sink.set_failing(true);

        // CRM 全挂，向导照常推进
        assert!(matches!(
            advance(&h, "s1", identity_input()).await,
            AdvanceOutcome::Advanced { .. }
        ));

        // 日志保留记录并标记未送达
        let leads = h.journal.all();
        assert_eq!(leads.len(), 1);
        assert!(!leads[0].delivered);

        // 捕获标记照常置位
        assert!(h.sessions.is_captured("s1"));
    }

    #[tokio::test]
    async fn test_strict_mode_propagates_delivery_failure() {
        let h = harness(true);
        h.sink.set_failing(true);

        let result = h
            .manager
            .advance("s1", CampaignRef::default(), None, None, identity_input())
            .await;

        assert!(matches!(result, Err(LeadgateError::CaptureDelivery(_))));
    }

    #[tokio::test]
    async fn test_back_keeps_fields_and_does_not_resubmit() {
        let h = harness(false);

        advance(&h, "s1", identity_input()).await;
        assert_eq!(h.sink.delivered_count(), 1);

        // 回到阶段 1
        assert_eq!(
            h.manager.back("s1").await.unwrap(),
            ProfileStage::Identity
        );

        // 重走阶段 1：不重复投递（投递阶段号保持单调不减）
        advance(&h, "s1", identity_input()).await;
        assert_eq!(h.sink.delivered_count(), 1);

        // 推进到阶段 2 时才有下一次投递
        advance(&h, "s1", contact_input()).await;
        let stages: Vec<Option<u8>> = h.sink.delivered().iter().map(|p| p.profile_stage).collect();
        assert_eq!(stages, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_back_at_first_stage_is_noop() {
        let h = harness(false);
        advance(&h, "s1", identity_input()).await;
        h.manager.back("s1").await.unwrap();

        // 已在第一阶段，back 停留原地
        assert_eq!(
            h.manager.back("s1").await.unwrap(),
            ProfileStage::Identity
        );
    }

    #[tokio::test]
    async fn test_back_without_wizard_is_not_found() {
        let h = harness(false);
        assert!(matches!(
            h.manager.back("ghost").await,
            Err(LeadgateError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stage_mismatch_is_rejected() {
        let h = harness(false);

        // 第一步就递交阶段 2 的输入
        let result = h
            .manager
            .advance("s1", CampaignRef::default(), None, None, contact_input())
            .await;

        assert!(matches!(result, Err(LeadgateError::SessionState(_))));
        assert_eq!(h.sink.delivered_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_is_terminal() {
        let h = harness(false);

        advance(&h, "s1", identity_input()).await;
        advance(&h, "s1", contact_input()).await;
        advance(&h, "s1", budget_input()).await;
        advance(&h, "s1", requirements_input()).await;

        let result = h
            .manager
            .advance("s1", CampaignRef::default(), None, None, requirements_input())
            .await;
        assert!(matches!(result, Err(LeadgateError::FunnelClosed(_))));
        assert!(matches!(
            h.manager.back("s1").await,
            Err(LeadgateError::FunnelClosed(_))
        ));

        // 完成后的向导没有"当前阶段"
        assert!(h.manager.stage_of("s1").await.is_none());
    }

    #[tokio::test]
    async fn test_attribution_attached_to_stage_payloads() {
        let h = harness(false);
        h.attribution.store_first_touch(
            "s1",
            extract_utm("https://site.in/godrej?utm_source=google&utm_campaign=launch"),
        );

        advance(&h, "s1", identity_input()).await;

        let delivered = h.sink.delivered();
        assert_eq!(delivered[0].utm_source.as_deref(), Some("google"));
        assert_eq!(delivered[0].utm_campaign.as_deref(), Some("launch"));
        assert!(delivered[0].utm_medium.is_none());
    }

    #[tokio::test]
    async fn test_consent_text_is_forwarded_verbatim() {
        let h = harness(false);
        advance(&h, "s1", identity_input()).await;

        assert_eq!(h.sink.delivered()[0].consent_text, CONSENT_TEXT);
        assert!(h.sink.delivered()[0].consent_given);
    }
}

#[cfg(test)]
mod single_shot_tests {
    use super::*;

    fn valid_form() -> SingleShotForm {
        SingleShotForm {
            first_name: "Rahul Sharma".to_string(),
            last_name: None,
            phone: "9876543210".to_string(),
            email: None,
            consent_given: true,
            consent_text: CONSENT_TEXT.to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_submission_is_captured() {
        let h = harness(false);

        let outcome = h
            .manager
            .submit_single_shot(
                "s1",
                CampaignRef {
                    property_slug: Some("godrej-emerald".to_string()),
                    campaign_slug: Some("monsoon-2026".to_string()),
                    property_title: Some("Godrej Emerald Waters".to_string()),
                },
                Some("https://site.in/godrej".to_string()),
                Some("hero_form".to_string()),
                valid_form(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));

        let delivered = h.sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].phone, "+919876543210");
        assert_eq!(delivered[0].source, "hero_form");
        assert_eq!(
            delivered[0].property_interest.as_deref(),
            Some("Godrej Emerald Waters")
        );
        assert_eq!(delivered[0].profile_stage, None);
        assert!(h.sessions.is_captured("s1"));
    }

    #[tokio::test]
    async fn test_invalid_submission_returns_field_errors() {
        let h = harness(false);

        let outcome = h
            .manager
            .submit_single_shot(
                "s1",
                CampaignRef::default(),
                None,
                None,
                SingleShotForm {
                    first_name: "A".to_string(),
                    last_name: None,
                    phone: "1234567890".to_string(),
                    email: None,
                    consent_given: true,
                    consent_text: CONSENT_TEXT.to_string(),
                },
            )
            .await
            .unwrap();

        let SubmitOutcome::Rejected { errors } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("first_name"));
        assert!(errors.contains_key("phone"));
        assert!(!h.sessions.is_captured("s1"));
    }

    #[tokio::test]
    async fn test_submission_succeeds_despite_crm_outage() {
        let h = harness(false);
        h.sink.set_failing(true);

        let outcome = h
            .manager
            .submit_single_shot("s1", CampaignRef::default(), None, None, valid_form())
            .await
            .unwrap();

        // 软失败：用户侧仍是成功态，会话仍被标记捕获
        assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));
        assert!(h.sessions.is_captured("s1"));
        assert!(!h.journal.all()[0].delivered);
    }

    #[tokio::test]
    async fn test_default_source_applied() {
        let h = harness(false);
        h.manager
            .submit_single_shot("s1", CampaignRef::default(), None, None, valid_form())
            .await
            .unwrap();

        assert_eq!(h.sink.delivered()[0].source, "website");
    }
}
