//! 首触归因存储
//!
//! 内存缓存（moka，TTL 可配）+ 可选 JSON 快照文件。
//! 写入遵循 first-touch：同一会话已有记录时后续写入为 no-op。
//! 快照文件缺失或损坏一律视为"无归因"，绝不致命。

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use moka::sync::Cache;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::AttributionRecord;
use crate::config::AttributionConfig;

pub struct AttributionStore {
    records: Cache<String, AttributionRecord>,
    snapshot_file: Option<PathBuf>,
    /// 快照写入串行化
    snapshot_lock: Mutex<()>,
}

impl AttributionStore {
    /// 按配置创建存储，存在快照文件时加载历史记录
    pub fn new(config: &AttributionConfig) -> Self {
        let records = Cache::builder()
            .time_to_live(Duration::from_secs(config.ttl_days * 24 * 60 * 60))
            .max_capacity(config.max_sessions)
            .build();

        let store = Self {
            records,
            snapshot_file: config.snapshot_file.as_ref().map(PathBuf::from),
            snapshot_lock: Mutex::new(()),
        };

        store.load_snapshot();
        store
    }

    /// 纯内存存储（测试用）
    pub fn in_memory() -> Self {
        Self::new(&AttributionConfig {
            snapshot_file: None,
            ..AttributionConfig::default()
        })
    }

    /// 首触写入：会话尚无记录时持久化，已有记录时 no-op
    ///
    /// 返回是否发生了实际写入。重复写入相同值除首次外无可观察副作用。
    pub fn store_first_touch(&self, session_id: &str, record: AttributionRecord) -> bool {
        if self.records.contains_key(session_id) {
            debug!("Attribution already captured for session {}, keeping first touch", session_id);
            return false;
        }

        self.records.insert(session_id.to_string(), record);
        self.persist_snapshot();
        true
    }

    /// 读取会话归因；无记录时返回全空记录，从不报错
    pub fn stored(&self, session_id: &str) -> AttributionRecord {
        self.records
            .get(session_id)
            .unwrap_or_else(AttributionRecord::empty)
    }

    /// 是否已有首触记录
    pub fn has_record(&self, session_id: &str) -> bool {
        self.records.contains_key(session_id)
    }

    /// 显式清除会话归因（常规流程不调用）
    pub fn clear(&self, session_id: &str) {
        self.records.invalidate(session_id);
        self.persist_snapshot();
    }

    /// 从快照文件加载；文件缺失或 JSON 损坏时按空处理
    fn load_snapshot(&self) {
        let Some(ref path) = self.snapshot_file else {
            return;
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                debug!("Attribution snapshot {} not found, starting empty", path.display());
                return;
            }
        };

        match serde_json::from_str::<HashMap<String, AttributionRecord>>(&content) {
            Ok(map) => {
                let count = map.len();
                for (session, record) in map {
                    self.records.insert(session, record);
                }
                debug!("Loaded {} attribution records from snapshot", count);
            }
            Err(e) => {
                // 损坏的快照视为无归因，不向上传播解析错误
                warn!("Malformed attribution snapshot {}, ignoring: {}", path.display(), e);
            }
        }
    }

    /// 将当前记录写回快照文件；失败仅记日志
    fn persist_snapshot(&self) {
        let Some(ref path) = self.snapshot_file else {
            return;
        };

        let _guard = self.snapshot_lock.lock();

        let map: HashMap<String, AttributionRecord> = self
            .records
            .iter()
            .map(|(session, record)| (session.as_ref().clone(), record))
            .collect();

        let json = match serde_json::to_string_pretty(&map) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize attribution snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(path, json) {
            warn!("Failed to write attribution snapshot {}: {}", path.display(), e);
        }
    }
}
