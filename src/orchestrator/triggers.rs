//! 触发信号与设备分类
//!
//! 前端上报的行为信号（停留时长、滚动深度、离开意图、页面隐藏），
//! 以及基于 User-Agent 的设备分类（决定离开意图信号的适用性）

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use woothee::parser::Parser;

/// 前端上报的触发信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum TriggerSignal {
    /// 页面停留时长（秒）
    TimeElapsed { seconds: u64 },
    /// 滚动深度（百分比 0-100）
    ScrollDepth { percent: u8 },
    /// 指针离开视口上缘（桌面端）
    ExitIntent,
    /// 页面不可见（移动端切后台/切标签）
    VisibilityHidden,
}

/// 设备分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
    /// 爬虫：任何情况下都不展示采集弹层
    Crawler,
}

impl DeviceClass {
    /// 从 User-Agent 推断设备分类
    ///
    /// 无 UA 或解析失败时按桌面端处理
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Self::Desktop;
        };

        let parser = Parser::new();
        let Some(result) = parser.parse(ua) else {
            return Self::Desktop;
        };

        match result.category {
            "crawler" => Self::Crawler,
            "smartphone" | "mobilephone" => Self::Mobile,
            _ => Self::Desktop,
        }
    }
}
