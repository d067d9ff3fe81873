//! 线索 CSV 导出共享逻辑
//!
//! 提供统一的 CSV 写出功能，供 CLI 和 Web Admin 使用。
//! 使用 csv crate 序列化，内嵌逗号/引号会被正确转义。

use chrono::Utc;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::capture::CapturedLead;
use crate::errors::LeadgateError;

/// 线索导出行（仅用于序列化）
#[derive(Debug, Clone, Serialize)]
pub struct LeadCsvRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub source: String,
    pub profile_stage: String,
    pub campaign: String,
    pub budget: String,
    pub city: String,
    pub consent: bool,
    pub delivered: bool,
    pub received_at: String,
}

impl From<&CapturedLead> for LeadCsvRow {
    fn from(lead: &CapturedLead) -> Self {
        let payload = &lead.payload;
        Self {
            id: lead.id.clone(),
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone().unwrap_or_default(),
            phone: payload.phone.clone(),
            email: payload.email.clone().unwrap_or_default(),
            source: payload.source.clone(),
            profile_stage: payload
                .profile_stage
                .map(|s| s.to_string())
                .unwrap_or_default(),
            campaign: payload.campaign_slug.clone().unwrap_or_default(),
            budget: payload.budget.clone().unwrap_or_default(),
            city: payload.current_city.clone().unwrap_or_default(),
            consent: payload.consent_given,
            delivered: lead.delivered,
            received_at: lead.received_at.to_rfc3339(),
        }
    }
}

/// 导出线索到 CSV 文件
pub fn export_to_csv<P: AsRef<Path>>(
    leads: &[CapturedLead],
    path: P,
) -> Result<(), LeadgateError> {
    let file = File::create(path.as_ref())
        .map_err(|e| LeadgateError::journal_operation(format!("Failed to create file: {}", e)))?;
    let writer = BufWriter::new(file);
    let mut csv_writer = WriterBuilder::new().from_writer(writer);

    for lead in leads {
        let row = LeadCsvRow::from(lead);
        csv_writer
            .serialize(&row)
            .map_err(|e| LeadgateError::serialization(format!("Failed to write CSV row: {}", e)))?;
    }

    csv_writer
        .flush()
        .map_err(|e| LeadgateError::journal_operation(format!("Failed to flush CSV: {}", e)))?;

    Ok(())
}

/// 导出线索为 CSV 字符串（HTTP 下载用）
pub fn leads_to_csv_string(leads: &[CapturedLead]) -> Result<String, LeadgateError> {
    let mut csv_writer = WriterBuilder::new().from_writer(Vec::new());

    for lead in leads {
        let row = LeadCsvRow::from(lead);
        csv_writer
            .serialize(&row)
            .map_err(|e| LeadgateError::serialization(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = csv_writer
        .into_inner()
        .map_err(|e| LeadgateError::serialization(format!("Failed to finish CSV: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| LeadgateError::serialization(format!("CSV output is not UTF-8: {}", e)))
}

/// 生成默认导出文件名（带时间戳）
pub fn generate_export_filename() -> String {
    format!("leads_export_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::LeadPayload;

    fn lead(first_name: &str, requirements: Option<&str>) -> CapturedLead {
        CapturedLead {
            id: "lead-1".to_string(),
            session_id: "s1".to_string(),
            received_at: Utc::now(),
            payload: LeadPayload {
                first_name: first_name.to_string(),
                last_name: Some("Sharma".to_string()),
                phone: "+919876543210".to_string(),
                email: Some("rahul@example.com".to_string()),
                property_interest: None,
                campaign_slug: Some("monsoon-2026".to_string()),
                source: "hero_form".to_string(),
                profile_stage: Some(2),
                consent_given: true,
                consent_text: "I authorise contact about this project.".to_string(),
                page_url: None,
                budget: Some("1.5cr-2cr".to_string()),
                buyer_status: None,
                current_city: Some("Gurgaon".to_string()),
                specific_requirements: requirements.map(|s| s.to_string()),
                utm_source: None,
                utm_medium: None,
                utm_campaign: None,
                utm_content: None,
                utm_term: None,
            },
            delivered: true,
        }
    }

    #[test]
    fn test_csv_row_from_lead() {
        let lead = lead("Rahul", None);
        let row = LeadCsvRow::from(&lead);

        assert_eq!(row.first_name, "Rahul");
        assert_eq!(row.phone, "+919876543210");
        assert_eq!(row.profile_stage, "2");
        assert_eq!(row.campaign, "monsoon-2026");
        assert!(row.consent);
    }

    #[test]
    fn test_csv_string_has_header_and_rows() {
        let csv = leads_to_csv_string(&[lead("Rahul", None)]).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("id,first_name,last_name,phone"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_embedded_commas_are_quoted() {
        // 自由文本带逗号时必须整体加引号
        let csv = leads_to_csv_string(&[lead("Rahul", Some("3BHK, park facing, corner unit"))])
            .unwrap();

        // csv crate 的转义不会把一行拆成多行
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");

        export_to_csv(&[lead("Rahul", None)], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Rahul"));
        assert!(content.contains("+919876543210"));
    }

    #[test]
    fn test_generate_export_filename() {
        let filename = generate_export_filename();
        assert!(filename.starts_with("leads_export_"));
        assert!(filename.ends_with(".csv"));
    }
}
