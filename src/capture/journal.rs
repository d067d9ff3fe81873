//! 线索日志
//!
//! 每条被接受的提交都追加到本地 JSON 日志（无论 CRM 投递成败），
//! 供管理端列表与 CSV 导出使用。文件损坏时按空日志处理。

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::payload::LeadPayload;
use crate::errors::Result;

/// 日志中的一条线索记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedLead {
    pub id: String,
    pub session_id: String,
    pub received_at: DateTime<Utc>,
    /// 实际发往 CRM 的载荷
    pub payload: LeadPayload,
    /// CRM 是否确认接收（软失败时为 false，记录仍保留）
    pub delivered: bool,
}

pub struct LeadJournal {
    file_path: Option<PathBuf>,
    leads: RwLock<Vec<CapturedLead>>,
}

impl LeadJournal {
    /// 文件日志：启动时加载既有记录
    pub fn new(file_path: &str) -> Self {
        let journal = Self {
            file_path: Some(PathBuf::from(file_path)),
            leads: RwLock::new(Vec::new()),
        };
        journal.load_from_file();
        journal
    }

    /// 纯内存日志（测试用）
    pub fn in_memory() -> Self {
        Self {
            file_path: None,
            leads: RwLock::new(Vec::new()),
        }
    }

    fn load_from_file(&self) {
        let Some(ref path) = self.file_path else {
            return;
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                debug!("Lead journal {} not found, starting empty", path.display());
                return;
            }
        };

        match serde_json::from_str::<Vec<CapturedLead>>(&content) {
            Ok(leads) => {
                debug!("Loaded {} leads from journal", leads.len());
                *self.leads.write() = leads;
            }
            Err(e) => {
                // 损坏的日志不阻断启动
                warn!("Malformed lead journal {}, starting empty: {}", path.display(), e);
            }
        }
    }

    fn save_to_file(&self) -> Result<()> {
        let Some(ref path) = self.file_path else {
            return Ok(());
        };

        let leads = self.leads.read();
        let json = serde_json::to_string_pretty(&*leads)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 追加一条记录并落盘
    pub fn append(
        &self,
        session_id: &str,
        payload: LeadPayload,
        delivered: bool,
    ) -> Result<CapturedLead> {
        let lead = CapturedLead {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            received_at: Utc::now(),
            payload,
            delivered,
        };

        self.leads.write().push(lead.clone());

        if let Err(e) = self.save_to_file() {
            // 落盘失败不影响漏斗主流程
            warn!("Failed to persist lead journal: {}", e);
        }

        Ok(lead)
    }

    pub fn all(&self) -> Vec<CapturedLead> {
        self.leads.read().clone()
    }

    pub fn len(&self) -> usize {
        self.leads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.read().is_empty()
    }
}
