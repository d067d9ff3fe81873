//! HTTP 服务层
//!
//! 采集入口（会话追踪 / 单次提交 / 渐进向导 / 触发评估）、
//! 管理接口与健康检查

pub mod admin_service;
pub mod capture_service;
pub mod health;

use serde::{Deserialize, Serialize};

pub use admin_service::AdminService;
pub use capture_service::CaptureService;
pub use health::HealthService;

/// 统一响应外壳
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub data: T,
}

/// 程序启动时间（健康检查用）
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
