//! 弹层触发编排
//!
//! 决定一个会话是否、以及展示哪一个自动采集弹层。
//! 约束：同一时刻至多一个弹层；每会话至多展示一次；
//! 已捕获的会话与爬虫永不展示；调用方可用 disable_auto 整体关闭。

pub mod bucketing;
pub mod triggers;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;
use ts_rs::TS;

use crate::config::TriggerConfig;
use crate::session::SessionState;

pub use bucketing::{POPUP_STYLE_EXPERIMENT, bucket_for, variant_for};
pub use triggers::{DeviceClass, TriggerSignal};

/// 自动采集弹层的样式（同时是 A/B 实验的两个变体）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, TS,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[ts(export)]
pub enum SurfaceKind {
    /// 离开意图弹层（完整表单）
    ExitIntentPopup,
    /// 手机号优先弹层（单字段快捕）
    PhoneFirstPopup,
}

const SURFACE_VARIANTS: [SurfaceKind; 2] =
    [SurfaceKind::ExitIntentPopup, SurfaceKind::PhoneFirstPopup];

/// 触发评估的请求上下文
#[derive(Debug, Clone, Default)]
pub struct TriggerContext {
    pub user_agent: Option<String>,
    /// 页面已有内联表单时由调用方置位，抑制所有自动弹层
    pub disable_auto: bool,
}

/// 弹层触发编排器
///
/// 无内部可变状态；会话状态由注入的 [`SessionState`] 承载，
/// 阈值来自配置。多个触发信号竞争时先到先得。
pub struct Orchestrator {
    config: TriggerConfig,
}

impl Orchestrator {
    pub fn new(config: TriggerConfig) -> Self {
        Self { config }
    }

    /// 评估一次触发信号，决定是否打开弹层
    ///
    /// 返回 Some(surface) 表示调用方应展示该弹层；
    /// None 表示信号被忽略（未达阈值或被抑制）。
    pub fn evaluate(
        &self,
        session_id: &str,
        state: &SessionState,
        signal: &TriggerSignal,
        ctx: &TriggerContext,
    ) -> Option<SurfaceKind> {
        if ctx.disable_auto {
            debug!("Trigger suppressed for {}: auto surfaces disabled by caller", session_id);
            return None;
        }

        if state.is_captured() {
            debug!("Trigger suppressed for {}: session already captured", session_id);
            return None;
        }

        let device = DeviceClass::from_user_agent(ctx.user_agent.as_deref());
        if device == DeviceClass::Crawler {
            debug!("Trigger suppressed for {}: crawler user agent", session_id);
            return None;
        }

        if !self.signal_fires(signal, device) {
            return None;
        }

        // 会话级 A/B 分桶决定弹层样式
        let surface = *variant_for(session_id, POPUP_STYLE_EXPERIMENT, &SURFACE_VARIANTS);

        // 并发触发竞争：只有第一个命中的信号能占到弹层槽位
        if state.try_open_surface(surface) {
            debug!("Surface {} opened for session {}", surface, session_id);
            Some(surface)
        } else {
            debug!("Trigger ignored for {}: surface already presented", session_id);
            None
        }
    }

    /// 关闭当前弹层（用户关闭或提交完成后调用）
    ///
    /// 关闭后该会话不再展示自动弹层
    pub fn dismiss(&self, session_id: &str, state: &SessionState) -> Option<SurfaceKind> {
        let closed = state.close_surface();
        if closed.is_some() {
            debug!("Surface dismissed for session {}", session_id);
        }
        closed
    }

    /// 信号是否达到触发条件
    fn signal_fires(&self, signal: &TriggerSignal, device: DeviceClass) -> bool {
        match signal {
            TriggerSignal::TimeElapsed { seconds } => *seconds >= self.config.time_delay_secs,
            TriggerSignal::ScrollDepth { percent } => *percent >= self.config.scroll_depth_pct,
            // 离开意图只在桌面端有意义
            TriggerSignal::ExitIntent => device == DeviceClass::Desktop,
            // 页面隐藏只作为移动端的离开信号
            TriggerSignal::VisibilityHidden => device == DeviceClass::Mobile,
        }
    }
}
