use actix_web::middleware::Next;
use actix_web::{
    Error, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use tracing::{debug, info};

use crate::config::get_config;

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(serde_json::json!({
            "code": 401,
            "data": { "error": "Unauthorized: Invalid or missing token" }
        }))
}

fn bearer_matches(req: &ServiceRequest, token: &str) -> bool {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Some(auth_bytes) = auth_header.as_bytes().strip_prefix(b"Bearer ") {
            return auth_bytes == token.as_bytes();
        }
    }
    false
}

pub struct AdminMiddleware;

impl AdminMiddleware {
    /// 管理接口鉴权中间件
    /// ADMIN_TOKEN 为空时整个管理接口视为禁用
    pub async fn admin_auth(
        req: ServiceRequest,
        next: Next<BoxBody>,
    ) -> Result<ServiceResponse<BoxBody>, Error> {
        if req.method() == actix_web::http::Method::OPTIONS {
            // 对于 OPTIONS 请求，直接返回 204 No Content
            return Ok(req.into_response(HttpResponse::NoContent().finish()));
        }

        let admin_token = &get_config().api.admin_token;

        // 如果 token 为空，认为 Admin API 被禁用
        if admin_token.is_empty() {
            return Ok(req.into_response(
                HttpResponse::NotFound()
                    .insert_header(("Content-Type", "text/html; charset=utf-8"))
                    .body("Not Found"),
            ));
        }

        if bearer_matches(&req, admin_token) {
            debug!("Admin API authentication succeeded");
            return next.call(req).await;
        }

        info!("Admin API authentication failed: token mismatch or missing Authorization header");
        Ok(req.into_response(unauthorized()))
    }
}

pub struct HealthMiddleware;

impl HealthMiddleware {
    /// 严格的健康检查中间件
    /// 当设置了特定的健康检查 token 时进行验证
    pub async fn health_auth(
        req: ServiceRequest,
        next: Next<BoxBody>,
    ) -> Result<ServiceResponse<BoxBody>, Error> {
        if req.method() == actix_web::http::Method::OPTIONS {
            return Ok(req.into_response(HttpResponse::NoContent().finish()));
        }

        let health_token = &get_config().api.health_token;

        // 如果 token 为空，认为 Health API 被禁用
        if health_token.is_empty() {
            return Ok(req.into_response(
                HttpResponse::NotFound()
                    .insert_header(("Content-Type", "text/html; charset=utf-8"))
                    .body("Not Found"),
            ));
        }

        if bearer_matches(&req, health_token) {
            debug!("Health API authentication succeeded");
            return next.call(req).await;
        }

        info!("Health API authentication failed: token mismatch or missing Authorization header");
        Ok(req.into_response(unauthorized()))
    }
}
