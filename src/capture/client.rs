//! CRM 投递客户端
//!
//! 将线索载荷 POST 到配置的采集端点。同步 HTTP（ureq）在
//! spawn_blocking 中执行。投递失败由调用方按软失败策略吸收：
//! 漏斗的用户可见状态永远不因 CRM 故障而失败。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};
use ureq::Agent;

use super::payload::LeadPayload;
use crate::errors::{LeadgateError, Result};

/// 线索投递目标
#[async_trait]
pub trait CaptureSink: Send + Sync {
    /// 投递一条线索
    ///
    /// 返回的错误只描述投递结果；是否向上传播由调用方的
    /// 软失败/严格模式决定。
    async fn deliver(&self, payload: &LeadPayload) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// HTTP 投递实现
pub struct HttpCaptureSink {
    endpoint: String,
    agent: Agent,
}

impl HttpCaptureSink {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build()
            .into();

        Self {
            endpoint: endpoint.to_string(),
            agent,
        }
    }

    /// 同步投递（在 spawn_blocking 中调用）
    fn deliver_sync(agent: Agent, endpoint: String, body: serde_json::Value) -> Result<()> {
        match agent.post(&endpoint).send_json(&body) {
            Ok(resp) => {
                debug!("Lead delivered to {} ({})", endpoint, resp.status());
                Ok(())
            }
            Err(e) => Err(LeadgateError::capture_delivery(format!(
                "POST {} failed: {}",
                endpoint, e
            ))),
        }
    }
}

#[async_trait]
impl CaptureSink for HttpCaptureSink {
    async fn deliver(&self, payload: &LeadPayload) -> Result<()> {
        let body = serde_json::to_value(payload)?;
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();

        // 同步 HTTP 放进线程池，避免阻塞 worker
        tokio::task::spawn_blocking(move || Self::deliver_sync(agent, endpoint, body))
            .await
            .unwrap_or_else(|e| {
                warn!("Capture delivery task failed to join: {}", e);
                Err(LeadgateError::capture_delivery(e.to_string()))
            })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// 内存投递目标（测试与演练用）：记录收到的载荷
#[derive(Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<LeadPayload>>,
    /// 置位后所有投递返回错误（模拟 CRM 故障）
    fail: Mutex<bool>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sink = Self::default();
        *sink.fail.lock() = true;
        Arc::new(sink)
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    pub fn delivered(&self) -> Vec<LeadPayload> {
        self.delivered.lock().clone()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().len()
    }
}

#[async_trait]
impl CaptureSink for MemorySink {
    async fn deliver(&self, payload: &LeadPayload) -> Result<()> {
        if *self.fail.lock() {
            return Err(LeadgateError::capture_delivery("simulated CRM outage"));
        }
        self.delivered.lock().push(payload.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
