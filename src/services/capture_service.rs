//! 采集入口服务
//!
//! 微站前端调用的四类入口：页面访问追踪（归因快照）、单次表单
//! 提交、渐进向导 continue/back、触发信号评估与弹层关闭。
//! 验证失败返回 422 + 字段错误映射；受理的提交一律回成功态。

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use ts_rs::TS;

use super::ApiResponse;
use crate::attribution::{AttributionRecord, AttributionStore, extract_utm};
use crate::capture::CampaignRef;
use crate::errors::LeadgateError;
use crate::funnel::{AdvanceOutcome, FunnelManager, ProfileStage, SingleShotForm, StageInput, SubmitOutcome};
use crate::orchestrator::{Orchestrator, SurfaceKind, TriggerContext, TriggerSignal};
use crate::session::SessionRegistry;
use crate::utils::new_session_id;
use crate::{
    publish_attribution_captured, publish_session_started, publish_surface_dismissed,
    publish_surface_opened,
};

/// 页面访问上报
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrackRequest {
    /// 缺省时由网关分配新会话
    #[serde(default)]
    pub session_id: Option<String>,
    pub page_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrackResponse {
    pub session_id: String,
    pub attribution: AttributionRecord,
    /// 本次上报是否构成首触写入
    pub first_touch: bool,
    pub captured: bool,
}

/// 单次表单提交请求
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmitLeadRequest {
    pub session_id: String,
    #[serde(default)]
    pub page_url: Option<String>,
    /// 提交来源标识（hero_form / sticky_bar / exit_popup ...）
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub campaign: CampaignRef,
    #[serde(flatten)]
    pub form: SingleShotForm,
}

/// 向导 continue 请求
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdvanceRequest {
    pub session_id: String,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub campaign: CampaignRef,
    pub input: StageInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BackRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BackResponse {
    #[ts(type = "number")]
    pub stage: ProfileStage,
}

/// 触发信号评估请求
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TriggerRequest {
    pub session_id: String,
    pub signal: TriggerSignal,
    /// 缺省时从 User-Agent 请求头读取
    #[serde(default)]
    pub user_agent: Option<String>,
    /// 页面已有内联表单时置位，抑制自动弹层
    #[serde(default)]
    pub disable_auto: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TriggerResponse {
    /// 应展示的弹层；None 表示本次信号被忽略
    pub open: Option<SurfaceKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DismissRequest {
    pub session_id: String,
}

pub struct CaptureService;

impl CaptureService {
    /// POST /v1/track: 页面访问：首触归因快照
    #[instrument(skip(body, attribution, sessions))]
    pub async fn track(
        body: web::Json<TrackRequest>,
        attribution: web::Data<Arc<AttributionStore>>,
        sessions: web::Data<Arc<SessionRegistry>>,
    ) -> impl Responder {
        let request = body.into_inner();
        let new_session = request.session_id.is_none();
        let session_id = request.session_id.unwrap_or_else(new_session_id);

        if new_session {
            publish_session_started!(&session_id, "capture_api");
        }

        let record = extract_utm(&request.page_url);
        let first_touch = attribution.store_first_touch(&session_id, record);
        if first_touch {
            let stored = attribution.stored(&session_id);
            let utm_source = (!stored.utm_source.is_empty()).then_some(stored.utm_source.as_str());
            publish_attribution_captured!(&session_id, utm_source, "capture_api");
        }

        let response = TrackResponse {
            attribution: attribution.stored(&session_id),
            first_touch,
            captured: sessions.is_captured(&session_id),
            session_id,
        };

        HttpResponse::Ok().json(ApiResponse {
            code: 0,
            data: response,
        })
    }

    /// POST /v1/leads: 单次表单提交
    #[instrument(skip(body, funnel), fields(session = %body.session_id))]
    pub async fn submit_lead(
        body: web::Json<SubmitLeadRequest>,
        funnel: web::Data<Arc<FunnelManager>>,
    ) -> impl Responder {
        let request = body.into_inner();

        let outcome = funnel
            .submit_single_shot(
                &request.session_id,
                request.campaign,
                request.page_url,
                request.source,
                request.form,
            )
            .await;

        match outcome {
            Ok(SubmitOutcome::Accepted { lead_id }) => HttpResponse::Ok().json(ApiResponse {
                code: 0,
                data: serde_json::json!({ "status": "captured", "lead_id": lead_id }),
            }),
            Ok(SubmitOutcome::Rejected { errors }) => {
                HttpResponse::UnprocessableEntity().json(ApiResponse {
                    code: 422,
                    data: serde_json::json!({ "errors": errors }),
                })
            }
            Err(e) => Self::error_response(e),
        }
    }

    /// POST /v1/funnel/advance: 向导 continue
    #[instrument(skip(body, funnel), fields(session = %body.session_id))]
    pub async fn funnel_advance(
        body: web::Json<AdvanceRequest>,
        funnel: web::Data<Arc<FunnelManager>>,
    ) -> impl Responder {
        let request = body.into_inner();

        let outcome = funnel
            .advance(
                &request.session_id,
                request.campaign,
                request.page_url,
                request.source,
                request.input,
            )
            .await;

        match outcome {
            Ok(AdvanceOutcome::Rejected { errors }) => {
                HttpResponse::UnprocessableEntity().json(ApiResponse {
                    code: 422,
                    data: serde_json::json!({ "errors": errors }),
                })
            }
            Ok(outcome) => HttpResponse::Ok().json(ApiResponse {
                code: 0,
                data: outcome,
            }),
            Err(e) => Self::error_response(e),
        }
    }

    /// POST /v1/funnel/back: 向导回退
    #[instrument(skip(body, funnel), fields(session = %body.session_id))]
    pub async fn funnel_back(
        body: web::Json<BackRequest>,
        funnel: web::Data<Arc<FunnelManager>>,
    ) -> impl Responder {
        match funnel.back(&body.session_id).await {
            Ok(stage) => HttpResponse::Ok().json(ApiResponse {
                code: 0,
                data: BackResponse { stage },
            }),
            Err(e) => Self::error_response(e),
        }
    }

    /// POST /v1/triggers: 触发信号评估
    #[instrument(skip(req, body, orchestrator, sessions), fields(session = %body.session_id))]
    pub async fn evaluate_trigger(
        req: HttpRequest,
        body: web::Json<TriggerRequest>,
        orchestrator: web::Data<Arc<Orchestrator>>,
        sessions: web::Data<Arc<SessionRegistry>>,
    ) -> impl Responder {
        let request = body.into_inner();

        let user_agent = request.user_agent.or_else(|| {
            req.headers()
                .get("User-Agent")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        });

        let ctx = TriggerContext {
            user_agent,
            disable_auto: request.disable_auto,
        };

        let state = sessions.state(&request.session_id);
        let open = orchestrator.evaluate(&request.session_id, &state, &request.signal, &ctx);

        if let Some(surface) = open {
            publish_surface_opened!(&request.session_id, &surface.to_string(), "capture_api");
        }

        HttpResponse::Ok().json(ApiResponse {
            code: 0,
            data: TriggerResponse { open },
        })
    }

    /// POST /v1/triggers/dismiss: 弹层关闭
    #[instrument(skip(body, orchestrator, sessions), fields(session = %body.session_id))]
    pub async fn dismiss_surface(
        body: web::Json<DismissRequest>,
        orchestrator: web::Data<Arc<Orchestrator>>,
        sessions: web::Data<Arc<SessionRegistry>>,
    ) -> impl Responder {
        let state = sessions.state(&body.session_id);
        if let Some(surface) = orchestrator.dismiss(&body.session_id, &state) {
            publish_surface_dismissed!(&body.session_id, &surface.to_string(), "capture_api");
        }

        HttpResponse::Ok().json(ApiResponse {
            code: 0,
            data: serde_json::json!({ "status": "dismissed" }),
        })
    }

    /// 引擎错误到 HTTP 状态的映射
    fn error_response(e: LeadgateError) -> HttpResponse {
        let status = match &e {
            LeadgateError::FunnelClosed(_) | LeadgateError::SessionState(_) => {
                actix_web::http::StatusCode::CONFLICT
            }
            LeadgateError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        HttpResponse::build(status).json(ApiResponse {
            code: status.as_u16() as i32,
            data: serde_json::json!({
                "error": e.message(),
                "error_code": e.code(),
            }),
        })
    }
}
