//! 健康检查服务

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;

use super::AppStartTime;
use crate::capture::LeadJournal;
use crate::session::SessionRegistry;

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    uptime_secs: i64,
    sessions_seen: usize,
    leads_captured: usize,
}

pub struct HealthService;

impl HealthService {
    /// GET /health: 运行状态与基本计数
    pub async fn health_check(
        start_time: web::Data<AppStartTime>,
        sessions: web::Data<Arc<SessionRegistry>>,
        journal: web::Data<Arc<LeadJournal>>,
    ) -> impl Responder {
        let uptime = chrono::Utc::now() - start_time.start_datetime;

        HttpResponse::Ok().json(HealthStatus {
            status: "ok",
            uptime_secs: uptime.num_seconds(),
            sessions_seen: sessions.len(),
            leads_captured: journal.len(),
        })
    }

    /// GET /health/ready
    pub async fn readiness_check() -> impl Responder {
        HttpResponse::Ok().json(serde_json::json!({ "status": "ready" }))
    }

    /// GET /health/live
    pub async fn liveness_check() -> impl Responder {
        HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
    }
}
