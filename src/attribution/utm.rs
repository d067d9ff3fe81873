//! UTM 参数提取
//!
//! 从落地页 URL 的查询串中提取五个 utm 参数
//! 解析失败时退化为手工拆分查询串，绝不报错

use url::Url;

use super::AttributionRecord;

/// 从落地页 URL 提取 UTM 参数
///
/// 接受完整 URL（`https://site.in/godrej?utm_source=google`）；
/// 相对路径（`/godrej?utm_source=google`）走手工解析兜底。
/// 无法解析时返回全空记录，从不返回错误。
pub fn extract_utm(page_url: &str) -> AttributionRecord {
    match Url::parse(page_url) {
        Ok(url) => {
            let mut record = AttributionRecord::empty();
            for (key, value) in url.query_pairs() {
                assign(&mut record, &key, &value);
            }
            record
        }
        Err(_) => extract_from_raw_query(page_url),
    }
}

/// 手工解析：取 `?` 之后的部分按 `&`/`=` 拆分并做百分号解码
fn extract_from_raw_query(page_url: &str) -> AttributionRecord {
    let mut record = AttributionRecord::empty();

    let Some((_, query)) = page_url.split_once('?') else {
        return record;
    };

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        // '+' 在查询串中表示空格
        assign(&mut record, key, &value.replace('+', " "));
    }

    record
}

fn assign(record: &mut AttributionRecord, key: &str, value: &str) {
    match key {
        "utm_source" => record.utm_source = value.to_string(),
        "utm_medium" => record.utm_medium = value.to_string(),
        "utm_campaign" => record.utm_campaign = value.to_string(),
        "utm_content" => record.utm_content = value.to_string(),
        "utm_term" => record.utm_term = value.to_string(),
        _ => {}
    }
}
