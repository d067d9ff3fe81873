//! 归因追踪模块
//!
//! 会话级首触（first-touch）UTM 归因：首次落地页访问时快照
//! 五个 utm 参数，之后同一会话内不再被覆盖，直至过期

pub mod store;
pub mod utm;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub use store::AttributionStore;
pub use utm::extract_utm;

/// 归因记录：每个会话捕获一次的活动参数
///
/// 所有字段默认为空字符串；缺失与空不作区分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttributionRecord {
    #[serde(default)]
    pub utm_source: String,
    #[serde(default)]
    pub utm_medium: String,
    #[serde(default)]
    pub utm_campaign: String,
    #[serde(default)]
    pub utm_content: String,
    #[serde(default)]
    pub utm_term: String,
}

impl AttributionRecord {
    /// 全空记录（查询不到归因时的返回值）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 是否未携带任何活动参数
    pub fn is_empty(&self) -> bool {
        self.utm_source.is_empty()
            && self.utm_medium.is_empty()
            && self.utm_campaign.is_empty()
            && self.utm_content.is_empty()
            && self.utm_term.is_empty()
    }
}
