// ==========================================
// AI能力交易平台 - 值转换器
// ==========================================
// 职责: 原始单元格文本 → 类型化值(日期/列表/格式化指标)
// 红线: 转换失败一律返回"无值",不抛错、不中断行处理
// ==========================================

use chrono::{Duration, NaiveDate};

/// 宽松日期解析
///
/// 解析顺序:
/// 1. 纯数字 → 按电子表格序列天数换算(纪元 1899-12-30)
/// 2. YYYY-MM-DD / YYYY/MM/DD / YYYY.MM.DD / YYYY年MM月DD日(日可省略)
/// 3. 常见日期时间格式兜底
///
/// 均不命中时返回 None,从不报错
pub fn parse_flexible_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    // 序列日期: 整串可解析为数字,按电子表格纪元(1899-12-30)换算
    if let Ok(serial) = s.parse::<f64>() {
        let days = serial.floor() as i64;
        return NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|epoch| epoch.checked_add_signed(Duration::days(days)));
    }

    // 显式文本格式,按声明顺序尝试
    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%Y.%m.%d",
        "%Y年%m月%d日",
        "%Y年%m月%d",
    ];
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // 兜底: 常见日期时间格式
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// 解析人名等分隔列表
///
/// 分隔符: 半角/全角逗号、顿号、半角/全角分号、任意空白
pub fn parse_name_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| matches!(c, ',' | '，' | '、' | ';' | '；') || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 解析 URL 列表(仅保留 http 开头的条目)
///
/// 分隔符: 半角/全角逗号、换行
pub fn parse_url_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| matches!(c, ',' | '，' | '\n' | '\r'))
        .map(str::trim)
        .filter(|s| s.starts_with("http"))
        .map(str::to_string)
        .collect()
}

/// 清洗数值文本: 仅保留数字、正负号、小数点
fn strip_to_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
        .collect()
}

/// 格式化百分比指标(效率提升/满意度)
///
/// 清洗后非空则补规范后缀 "%";无显式符号时默认 "+"
pub fn format_percentage(raw: &str) -> Option<String> {
    let cleaned = strip_to_numeric(raw);
    if cleaned.is_empty() {
        return None;
    }
    let signed = if cleaned.starts_with('+') || cleaned.starts_with('-') {
        cleaned
    } else {
        format!("+{}", cleaned)
    };
    Some(format!("{}%", signed))
}

/// 格式化年度成本节约指标
///
/// 清洗后非空则补规范后缀 "/每年";保留显式符号,不补默认符号
pub fn format_currency_per_year(raw: &str) -> Option<String> {
    let cleaned = strip_to_numeric(raw);
    if cleaned.is_empty() {
        return None;
    }
    Some(format!("{}/每年", cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_four_explicit_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        for input in ["2024-01-15", "2024/01/15", "2024.01.15", "2024年1月15日"] {
            assert_eq!(parse_flexible_date(input), Some(expected), "输入: {}", input);
        }
        // 省略"日"的变体
        assert_eq!(parse_flexible_date("2024年1月15"), Some(expected));
    }

    #[test]
    fn test_parse_date_serial_number() {
        // 序列 45000 对应 2023-03-15(纪元 1899-12-30)
        assert_eq!(
            parse_flexible_date("45000"),
            NaiveDate::from_ymd_opt(2023, 3, 15)
        );
        // 与纪元自洽: 序列 1 = 1899-12-31
        assert_eq!(
            parse_flexible_date("1"),
            NaiveDate::from_ymd_opt(1899, 12, 31)
        );
    }

    #[test]
    fn test_parse_date_unparsable_returns_none() {
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("待定"), None);
        assert_eq!(parse_flexible_date("2024-13-99"), None);
    }

    #[test]
    fn test_parse_name_list_mixed_delimiters() {
        assert_eq!(
            parse_name_list("张三、李四，王五; 赵六"),
            vec!["张三", "李四", "王五", "赵六"]
        );
        assert_eq!(parse_name_list("  "), Vec::<String>::new());
    }

    #[test]
    fn test_parse_url_list_filters_non_http() {
        let urls = parse_url_list("https://a.example/v1.mp4，见附件\nhttp://b.example/v2.mp4");
        assert_eq!(
            urls,
            vec!["https://a.example/v1.mp4", "http://b.example/v2.mp4"]
        );
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage("20"), Some("+20%".to_string()));
        assert_eq!(format_percentage("+20"), Some("+20%".to_string()));
        assert_eq!(format_percentage("-5.5"), Some("-5.5%".to_string()));
        assert_eq!(format_percentage("约20%"), Some("+20%".to_string()));
        assert_eq!(format_percentage("待测"), None);
    }

    #[test]
    fn test_format_currency_per_year() {
        assert_eq!(format_currency_per_year("50"), Some("50/每年".to_string()));
        assert_eq!(
            format_currency_per_year("10万元"),
            Some("10/每年".to_string())
        );
        assert_eq!(format_currency_per_year(""), None);
    }
}
