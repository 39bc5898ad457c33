// ==========================================
// AI能力交易平台 - 分析响应提取与校验
// ==========================================
// 职责: 从分析服务的自由文本响应中提取首个合法 JSON 对象,
//       并按显式 schema 校验为 ParsedProjectDocument
// 口径: 响应可能包裹在代码块或散文中;提取失败是带标签的
//       结果变体(ParseFailure),不是假设良构后的崩溃
// ==========================================

use crate::importer::field_normalizer::{CanonicalField, NormalizedRow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 默认提取指令(分析服务的键名即规范字段名)
pub const DEFAULT_PARSE_PROMPT: &str = r#"你是一个专业的项目信息提取助手。请从用户提供的文档中提取项目相关信息,并以JSON格式返回。

需要提取的字段包括:
1. name: 项目名称(字符串)
2. implementers: 项目实施人列表(字符串数组,如:["张三", "李四"])
3. requesterDepartment: 需求提出部门(字符串)
4. requesterName: 需求方姓名(字符串)
5. background: 项目背景(字符串,描述项目面临的问题或痛点)
6. solution: 解决方案(字符串,描述如何解决问题)
7. features: 核心功能(字符串,每行一个功能点,用换行符分隔)
8. estimatedImpact: 预估效果(字符串)
9. actualImpact: 实际效果(字符串)
10. efficiency: 效率提升(字符串,如:"+20%")
11. costSaving: 成本节约(字符串,如:"10万元/每年")
12. satisfaction: 满意度提升(字符串,如:"+15%")
13. status: 项目状态(字符串,可选值:需求已确认、排期中、生产中、交付未投产、交付已投产)
14. categories: 所属业务范畴(字符串数组)
15. departments: 赋能业务部门(字符串数组)
16. launchDate: 上线日期(字符串,格式:YYYY-MM-DD)

请仔细分析文档内容,提取相关信息。如果某个字段在文档中没有明确提及,请返回null或空数组。

返回格式必须是有效的JSON对象,不要包含任何额外的文本或markdown格式。"#;

// ==========================================
// ParsedProjectDocument - 解析结果 schema
// ==========================================
// 键名与规范字段名一致(camelCase);缺失字段一律容忍
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedProjectDocument {
    pub name: Option<String>,
    pub implementers: Vec<String>,
    pub requester_department: Option<String>,
    pub requester_name: Option<String>,
    pub background: Option<String>,
    pub solution: Option<String>,
    pub features: Option<String>,
    pub estimated_impact: Option<String>,
    pub actual_impact: Option<String>,
    pub efficiency: Option<String>,
    pub cost_saving: Option<String>,
    pub satisfaction: Option<String>,
    pub status: Option<String>,
    pub categories: Vec<String>,
    pub departments: Vec<String>,
    pub launch_date: Option<String>,
}

impl ParsedProjectDocument {
    /// 转换为规范字段行,供规范项目构建器消费
    pub fn into_row(self) -> NormalizedRow {
        let mut row = NormalizedRow::default();
        let mut put = |field: CanonicalField, value: Option<String>| {
            if let Some(v) = value {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    row.fields.insert(field, trimmed.to_string());
                }
            }
        };

        put(CanonicalField::Title, self.name);
        put(CanonicalField::Background, self.background);
        put(CanonicalField::Solution, self.solution);
        put(CanonicalField::Features, self.features);
        put(CanonicalField::EstimatedImpact, self.estimated_impact);
        put(CanonicalField::ActualImpact, self.actual_impact);
        put(CanonicalField::Efficiency, self.efficiency);
        put(CanonicalField::CostSaving, self.cost_saving);
        put(CanonicalField::Satisfaction, self.satisfaction);
        put(CanonicalField::Status, self.status);
        put(CanonicalField::LaunchDate, self.launch_date);
        put(CanonicalField::RequesterName, self.requester_name);
        put(
            CanonicalField::Category,
            self.categories.first().cloned(),
        );
        if !self.implementers.is_empty() {
            put(
                CanonicalField::Implementers,
                Some(self.implementers.join("、")),
            );
        }
        if !self.departments.is_empty() {
            put(
                CanonicalField::EmpoweredDepartments,
                Some(self.departments.join("、")),
            );
        }
        row
    }
}

// ==========================================
// DocumentParseOutcome - 带标签的提取结果
// ==========================================
#[derive(Debug, Clone)]
pub enum DocumentParseOutcome {
    /// 提取并通过 schema 校验
    Parsed(ParsedProjectDocument),
    /// 响应中找不到合法 JSON 对象,或校验失败
    ParseFailure { reason: String },
}

/// 从响应文本解析项目文档
pub fn parse_analysis_response(text: &str) -> DocumentParseOutcome {
    let Some(json_text) = extract_json_object(text) else {
        return DocumentParseOutcome::ParseFailure {
            reason: "响应中未找到 JSON 对象".to_string(),
        };
    };

    match serde_json::from_str::<ParsedProjectDocument>(&json_text) {
        Ok(doc) => {
            debug!(fields = %json_text.len(), "分析响应解析成功");
            DocumentParseOutcome::Parsed(doc)
        }
        Err(e) => DocumentParseOutcome::ParseFailure {
            reason: format!("JSON 校验失败: {}", e),
        },
    }
}

/// 提取首个配平的 JSON 对象
///
/// 容忍代码块围栏与前后散文;括号配平扫描忽略字符串字面量
/// 内的花括号
pub fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + c.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_fenced_block() {
        let text = "解析结果如下:\n```json\n{\"name\": \"智能客服\", \"implementers\": [\"张三\"]}\n```\n以上。";
        let json = extract_json_object(text).unwrap();
        assert!(json.starts_with('{') && json.ends_with('}'));

        match parse_analysis_response(text) {
            DocumentParseOutcome::Parsed(doc) => {
                assert_eq!(doc.name.as_deref(), Some("智能客服"));
                assert_eq!(doc.implementers, vec!["张三"]);
            }
            DocumentParseOutcome::ParseFailure { reason } => panic!("解析失败: {}", reason),
        }
    }

    #[test]
    fn test_extract_from_prose_with_trailing_brace() {
        // 对象之后的散文含有花括号,配平扫描不应被带偏
        let text = "结果 {\"name\": \"数据看板\"} 备注: {无关}";
        let json = extract_json_object(text).unwrap();
        assert_eq!(json, "{\"name\": \"数据看板\"}");
    }

    #[test]
    fn test_extract_ignores_braces_inside_strings() {
        let text = "{\"name\": \"包含}花括号\", \"solution\": \"x\"}";
        let json = extract_json_object(text).unwrap();
        assert_eq!(json, text);
    }

    #[test]
    fn test_parse_failure_on_missing_object() {
        match parse_analysis_response("没有任何结构化内容") {
            DocumentParseOutcome::ParseFailure { reason } => {
                assert!(reason.contains("未找到"));
            }
            DocumentParseOutcome::Parsed(_) => panic!("应判定为提取失败"),
        }
    }

    #[test]
    fn test_parse_failure_on_malformed_json() {
        match parse_analysis_response("{\"name\": }") {
            DocumentParseOutcome::ParseFailure { reason } => {
                assert!(reason.contains("校验失败"));
            }
            DocumentParseOutcome::Parsed(_) => panic!("应判定为校验失败"),
        }
    }

    #[test]
    fn test_into_row_canonical_fields() {
        let doc = ParsedProjectDocument {
            name: Some("智能客服".to_string()),
            implementers: vec!["张三".to_string(), "李四".to_string()],
            status: Some("生产中".to_string()),
            categories: vec!["客服".to_string(), "数据".to_string()],
            departments: vec!["客服部".to_string()],
            ..Default::default()
        };
        let row = doc.into_row();
        assert_eq!(row.get(CanonicalField::Title), Some("智能客服"));
        assert_eq!(row.get(CanonicalField::Implementers), Some("张三、李四"));
        assert_eq!(row.get(CanonicalField::Status), Some("生产中"));
        assert_eq!(row.get(CanonicalField::Category), Some("客服"));
        assert_eq!(
            row.get(CanonicalField::EmpoweredDepartments),
            Some("客服部")
        );
    }

    #[test]
    fn test_schema_tolerates_null_and_missing_fields() {
        let text = "{\"name\": \"工单助手\", \"background\": null}";
        match parse_analysis_response(text) {
            DocumentParseOutcome::Parsed(doc) => {
                assert_eq!(doc.name.as_deref(), Some("工单助手"));
                assert!(doc.background.is_none());
                assert!(doc.implementers.is_empty());
            }
            DocumentParseOutcome::ParseFailure { reason } => panic!("解析失败: {}", reason),
        }
    }
}
