//! 管理接口
//!
//! 线索日志的列表查询与 CSV 导出（Bearer token 鉴权在中间件完成）

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiResponse;
use crate::capture::{CapturedLead, LeadJournal};
use crate::utils::csv_handler;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLeadsQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    /// 仅保留指定来源（hero_form / sticky_bar / ...）
    pub source: Option<String>,
    /// 仅保留指定画像阶段
    pub stage: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<CapturedLead>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

pub struct AdminService;

impl AdminService {
    /// GET /admin/leads: 分页列出线索
    #[instrument(skip(journal, query))]
    pub async fn get_leads(
        journal: web::Data<Arc<LeadJournal>>,
        query: web::Query<GetLeadsQuery>,
    ) -> impl Responder {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query.page_size.unwrap_or(50).clamp(1, 500);

        let filtered: Vec<CapturedLead> = journal
            .all()
            .into_iter()
            .filter(|lead| {
                query
                    .source
                    .as_deref()
                    .is_none_or(|s| lead.payload.source == s)
            })
            .filter(|lead| query.stage.is_none_or(|s| lead.payload.profile_stage == Some(s)))
            .collect();

        let total = filtered.len();
        let leads: Vec<CapturedLead> = filtered
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        HttpResponse::Ok().json(ApiResponse {
            code: 0,
            data: LeadListResponse {
                leads,
                total,
                page,
                page_size,
            },
        })
    }

    /// GET /admin/leads/export: 导出 CSV 附件
    #[instrument(skip(journal))]
    pub async fn export_leads(journal: web::Data<Arc<LeadJournal>>) -> impl Responder {
        let leads = journal.all();

        match csv_handler::leads_to_csv_string(&leads) {
            Ok(csv) => {
                let filename = csv_handler::generate_export_filename();
                HttpResponse::Ok()
                    .insert_header(("Content-Type", "text/csv; charset=utf-8"))
                    .insert_header((
                        "Content-Disposition",
                        format!("attachment; filename=\"{}\"", filename),
                    ))
                    .body(csv)
            }
            Err(e) => HttpResponse::InternalServerError().json(ApiResponse {
                code: 500,
                data: serde_json::json!({ "error": e.message() }),
            }),
        }
    }
}
