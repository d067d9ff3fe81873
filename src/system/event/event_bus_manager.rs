use crate::system::event::{EventBus, EventHandler};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// 全局事件总线实例
/// 使用 Lazy 确保线程安全的单例模式
pub static GLOBAL_EVENT_BUS: Lazy<Arc<EventBus>> = Lazy::new(|| {
    Arc::new(EventBus::new(1000)) // 保留最近 1000 个事件的历史记录
});

/// 事件总线管理器
/// 提供便捷的方法来访问和管理全局事件总线
pub struct EventBusManager;

impl EventBusManager {
    /// 获取全局事件总线的引用
    pub fn instance() -> Arc<EventBus> {
        GLOBAL_EVENT_BUS.clone()
    }

    /// 注册事件处理器到全局事件总线
    pub fn register_handler(handler: Arc<dyn EventHandler>) {
        GLOBAL_EVENT_BUS.register_handler(handler);
    }

    /// 清理事件历史（可用于内存管理）
    pub fn clear_history() {
        GLOBAL_EVENT_BUS.clear_history();
    }

    /// 获取事件历史的统计信息
    pub fn get_history_stats() -> (usize, Vec<String>) {
        let history = GLOBAL_EVENT_BUS.get_history();
        let count = history.len();
        let recent_events: Vec<String> = history
            .iter()
            .rev()
            .take(5)
            .map(|e| format!("{:?} from {}", e.event_type, e.source))
            .collect();

        (count, recent_events)
    }
}

/// 便捷宏：快速发布事件
#[macro_export]
macro_rules! publish_event {
    ($event:expr) => {
        if let Err(e) = $crate::system::event::event_bus_manager::GLOBAL_EVENT_BUS
            .publish($event)
            .await
        {
            tracing::error!("Failed to publish event: {}", e);
        }
    };
}

/// 便捷宏：创建并发布会话开始事件
#[macro_export]
macro_rules! publish_session_started {
    ($session:expr, $source:expr) => {
        $crate::publish_event!($crate::system::event::Event::session_started(
            $session, $source
        ));
    };
}

/// 便捷宏：创建并发布归因捕获事件
#[macro_export]
macro_rules! publish_attribution_captured {
    ($session:expr, $utm_source:expr, $source:expr) => {
        $crate::publish_event!($crate::system::event::Event::attribution_captured(
            $session,
            $utm_source,
            $source
        ));
    };
}

/// 便捷宏：创建并发布画像阶段提交事件
#[macro_export]
macro_rules! publish_stage_submitted {
    ($session:expr, $stage:expr, $source:expr) => {
        $crate::publish_event!($crate::system::event::Event::stage_submitted(
            $session, $stage, $source
        ));
    };
}

/// 便捷宏：创建并发布线索捕获完成事件
#[macro_export]
macro_rules! publish_lead_captured {
    ($session:expr, $source:expr) => {
        $crate::publish_event!($crate::system::event::Event::lead_captured(
            $session, $source
        ));
    };
}

/// 便捷宏：创建并发布弹层展示事件
#[macro_export]
macro_rules! publish_surface_opened {
    ($session:expr, $surface:expr, $source:expr) => {
        $crate::publish_event!($crate::system::event::Event::surface_opened(
            $session, $surface, $source
        ));
    };
}

/// 便捷宏：创建并发布弹层关闭事件
#[macro_export]
macro_rules! publish_surface_dismissed {
    ($session:expr, $surface:expr, $source:expr) => {
        $crate::publish_event!($crate::system::event::Event::surface_dismissed(
            $session, $surface, $source
        ));
    };
}
