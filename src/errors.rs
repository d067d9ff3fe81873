use std::fmt;

#[derive(Debug, Clone)]
pub enum LeadgateError {
    Validation(String),
    ConsentMissing(String),
    AttributionStorage(String),
    JournalOperation(String),
    CaptureDelivery(String),
    SessionState(String),
    FunnelClosed(String),
    NotFound(String),
    Serialization(String),
    ConfigLoad(String),
    DateParse(String),
}

impl LeadgateError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LeadgateError::Validation(_) => "E001",
            LeadgateError::ConsentMissing(_) => "E002",
            LeadgateError::AttributionStorage(_) => "E003",
            LeadgateError::JournalOperation(_) => "E004",
            LeadgateError::CaptureDelivery(_) => "E005",
            LeadgateError::SessionState(_) => "E006",
            LeadgateError::FunnelClosed(_) => "E007",
            LeadgateError::NotFound(_) => "E008",
            LeadgateError::Serialization(_) => "E009",
            LeadgateError::ConfigLoad(_) => "E010",
            LeadgateError::DateParse(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LeadgateError::Validation(_) => "Validation Error",
            LeadgateError::ConsentMissing(_) => "Consent Missing",
            LeadgateError::AttributionStorage(_) => "Attribution Storage Error",
            LeadgateError::JournalOperation(_) => "Journal Operation Error",
            LeadgateError::CaptureDelivery(_) => "Capture Delivery Error",
            LeadgateError::SessionState(_) => "Session State Error",
            LeadgateError::FunnelClosed(_) => "Funnel Closed",
            LeadgateError::NotFound(_) => "Resource Not Found",
            LeadgateError::Serialization(_) => "Serialization Error",
            LeadgateError::ConfigLoad(_) => "Configuration Load Error",
            LeadgateError::DateParse(_) => "Date Parse Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LeadgateError::Validation(msg) => msg,
            LeadgateError::ConsentMissing(msg) => msg,
            LeadgateError::AttributionStorage(msg) => msg,
            LeadgateError::JournalOperation(msg) => msg,
            LeadgateError::CaptureDelivery(msg) => msg,
            LeadgateError::SessionState(msg) => msg,
            LeadgateError::FunnelClosed(msg) => msg,
            LeadgateError::NotFound(msg) => msg,
            LeadgateError::Serialization(msg) => msg,
            LeadgateError::ConfigLoad(msg) => msg,
            LeadgateError::DateParse(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LeadgateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LeadgateError {}

// 便捷的构造函数
impl LeadgateError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LeadgateError::Validation(msg.into())
    }

    pub fn consent_missing<T: Into<String>>(msg: T) -> Self {
        LeadgateError::ConsentMissing(msg.into())
    }

    pub fn attribution_storage<T: Into<String>>(msg: T) -> Self {
        LeadgateError::AttributionStorage(msg.into())
    }

    pub fn journal_operation<T: Into<String>>(msg: T) -> Self {
        LeadgateError::JournalOperation(msg.into())
    }

    pub fn capture_delivery<T: Into<String>>(msg: T) -> Self {
        LeadgateError::CaptureDelivery(msg.into())
    }

    pub fn session_state<T: Into<String>>(msg: T) -> Self {
        LeadgateError::SessionState(msg.into())
    }

    pub fn funnel_closed<T: Into<String>>(msg: T) -> Self {
        LeadgateError::FunnelClosed(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LeadgateError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LeadgateError::Serialization(msg.into())
    }

    pub fn config_load<T: Into<String>>(msg: T) -> Self {
        LeadgateError::ConfigLoad(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        LeadgateError::DateParse(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for LeadgateError {
    fn from(err: std::io::Error) -> Self {
        LeadgateError::JournalOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LeadgateError {
    fn from(err: serde_json::Error) -> Self {
        LeadgateError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LeadgateError {
    fn from(err: chrono::ParseError) -> Self {
        LeadgateError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeadgateError>;
