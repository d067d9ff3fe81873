pub mod csv_handler;

/// 生成新的会话标识
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
