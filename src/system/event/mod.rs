//! 事件系统
//!
//! 漏斗生命周期事件的发布/订阅总线

pub mod event_bus_manager;
pub mod events;

pub use event_bus_manager::{EventBusManager, GLOBAL_EVENT_BUS};
pub use events::{Event, EventBuilder, EventBus, EventHandler, EventPayload, EventType};
