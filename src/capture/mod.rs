//! 线索采集模块
//!
//! 出站载荷构造、CRM 投递（软失败）与本地线索日志

pub mod client;
pub mod journal;
pub mod payload;

pub use client::{CaptureSink, HttpCaptureSink, MemorySink};
pub use journal::{CapturedLead, LeadJournal};
pub use payload::{CampaignRef, LeadPayload};
