//! 表单字段验证模块
//!
//! 线索表单的纯函数验证：姓名、手机号（印度 10 位）、邮箱、授权勾选
//! 所有函数同步、无副作用，调用方聚合为 field -> message 映射

use std::collections::HashMap;

/// 字段验证错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// 为空或长度不足
    EmptyOrTooShort { field: &'static str, min: usize },
    /// 格式不合法
    InvalidFormat { field: &'static str, hint: &'static str },
    /// 未勾选授权
    ConsentRequired,
}

impl FieldError {
    /// 错误归属的字段名（作为前端错误映射的 key）
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::EmptyOrTooShort { field, .. } => field,
            Self::InvalidFormat { field, .. } => field,
            Self::ConsentRequired => "consent",
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOrTooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::InvalidFormat { field, hint } => write!(f, "Invalid {}: {}", field, hint),
            Self::ConsentRequired => write!(f, "Consent is required before submitting"),
        }
    }
}

impl std::error::Error for FieldError {}

/// 姓名最小长度（去除首尾空白后）
const MIN_NAME_LENGTH: usize = 2;
/// 印度手机号长度
const PHONE_DIGITS: usize = 10;

/// 验证姓名：去除首尾空白后长度至少 2
pub fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.trim().chars().count() < MIN_NAME_LENGTH {
        return Err(FieldError::EmptyOrTooShort {
            field: "first_name",
            min: MIN_NAME_LENGTH,
        });
    }
    Ok(())
}

/// 归一化手机号：仅保留数字并截断到 10 位
///
/// 与前端输入框的行为保持一致：`replace(/\D/g, '').slice(0, 10)`
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_DIGITS)
        .collect()
}

/// 验证手机号
///
/// 检查项目：
/// 1. 归一化后恰好 10 位数字
/// 2. 首位数字为 6-9（印度移动号段）
pub fn validate_phone(phone: &str) -> Result<(), FieldError> {
    let digits = normalize_phone(phone);

    if digits.len() != PHONE_DIGITS {
        return Err(FieldError::InvalidFormat {
            field: "phone",
            hint: "enter a 10-digit mobile number",
        });
    }

    // 首位必须是 6-9
    if !matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return Err(FieldError::InvalidFormat {
            field: "phone",
            hint: "mobile numbers start with 6-9",
        });
    }

    Ok(())
}

/// 格式化为 E.164（印度 +91 前缀），输入必须已通过 validate_phone
pub fn format_e164(phone: &str) -> String {
    format!("+91{}", normalize_phone(phone))
}

/// 验证邮箱：必须有本地部分、@、带点的域名
///
/// 仅做结构检查，不做 RFC 完整校验（与采集表单的宽松语义一致）
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    let email = email.trim();

    let invalid = FieldError::InvalidFormat {
        field: "email",
        hint: "enter a valid email address",
    };

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid);
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid);
    }

    // 域名必须含点，且点不在首尾
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid);
    };
    if host.is_empty() || tld.is_empty() {
        return Err(invalid);
    }

    if email.contains(char::is_whitespace) {
        return Err(invalid);
    }

    Ok(())
}

/// 验证授权勾选：提交前必须为 true
pub fn validate_consent(consent_given: bool) -> Result<(), FieldError> {
    if !consent_given {
        return Err(FieldError::ConsentRequired);
    }
    Ok(())
}

/// 字段验证结果聚合
///
/// field_name -> 人类可读错误消息；非空时阻止提交
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    errors: HashMap<String, String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次验证结果，失败则写入错误映射
    pub fn check(&mut self, result: Result<(), FieldError>) {
        if let Err(e) = result {
            self.errors.insert(e.field_name().to_string(), e.to_string());
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&String> {
        self.errors.get(field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// 取出 field -> message 映射（提供给 API 响应）
    pub fn into_map(self) -> HashMap<String, String> {
        self.errors
    }

    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("Rahul Sharma").is_ok());
        assert!(validate_name("Om").is_ok());
        assert!(validate_name("  Priya  ").is_ok());
    }

    #[test]
    fn test_short_names() {
        assert!(matches!(
            validate_name("A"),
            Err(FieldError::EmptyOrTooShort { .. })
        ));
        assert!(matches!(
            validate_name(""),
            Err(FieldError::EmptyOrTooShort { .. })
        ));
        // 空白不计入长度
        assert!(matches!(
            validate_name("  R  "),
            Err(FieldError::EmptyOrTooShort { .. })
        ));
    }

    #[test]
    fn test_valid_phones() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("6000000000").is_ok());
        assert!(validate_phone("98765 43210").is_ok());
        assert!(validate_phone("98-76-54-32-10").is_ok());
    }

    #[test]
    fn test_invalid_phones() {
        // 首位不在 6-9
        assert!(matches!(
            validate_phone("1234567890"),
            Err(FieldError::InvalidFormat { field: "phone", .. })
        ));
        // 位数不足
        assert!(validate_phone("98765").is_err());
        assert!(validate_phone("").is_err());
        // 纯字母
        assert!(validate_phone("abcdefghij").is_err());
    }

    #[test]
    fn test_phone_normalization_truncates() {
        // 超长输入截断到 10 位后再校验
        assert_eq!(normalize_phone("987654321099"), "9876543210");
        assert!(validate_phone("987654321099").is_ok());
        // 带 +91 前缀：截断后以 9 开头，按前端同样的宽松规则放行
        assert_eq!(normalize_phone("+91 9876543210"), "9198765432");
        assert!(validate_phone("+91 9876543210").is_ok());
    }

    #[test]
    fn test_format_e164() {
        assert_eq!(format_e164("9876543210"), "+919876543210");
        assert_eq!(format_e164("98765 43210"), "+919876543210");
    }

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("amit@x.com").is_ok());
        assert!(validate_email("first.last@sub.example.co.in").is_ok());
        assert!(validate_email("  padded@example.com  ").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@domain.").is_err());
        assert!(validate_email("user@.com").is_err());
        assert!(validate_email("two words@example.com").is_err());
    }

    #[test]
    fn test_consent() {
        assert!(validate_consent(true).is_ok());
        assert!(matches!(
            validate_consent(false),
            Err(FieldError::ConsentRequired)
        ));
    }

    #[test]
    fn test_report_aggregation() {
        // 姓名过短 + 首位非法手机号 => 两个字段错误
        let mut report = ValidationReport::new();
        report.check(validate_name("A"));
        report.check(validate_phone("1234567890"));

        assert!(!report.is_ok());
        assert_eq!(report.len(), 2);
        assert!(report.get("first_name").is_some());
        assert!(report.get("phone").is_some());
    }

    #[test]
    fn test_report_all_pass() {
        let mut report = ValidationReport::new();
        report.check(validate_name("Rahul Sharma"));
        report.check(validate_phone("9876543210"));
        report.check(validate_consent(true));

        assert!(report.is_ok());
        assert!(report.into_map().is_empty());
    }
}
