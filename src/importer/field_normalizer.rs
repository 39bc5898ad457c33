// ==========================================
// AI能力交易平台 - 字段归一化器
// ==========================================
// 职责: 异构来源标签(表格列名/分析服务键名) → 规范字段
// 三级匹配: 精确词典 → 归一化子串(声明顺序优先) → 丢弃
// 红线: 子串规则表的声明顺序是裁决契约,不得重排
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

// ==========================================
// CanonicalField - 规范字段
// ==========================================
// 所有摄入渠道共同收敛的内部字段名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Title,
    Background,
    Solution,
    Features,
    EstimatedImpact,
    ActualImpact,
    EmpoweredDepartments,
    Region,
    DemoVideo,
    ProjectLinks,
    Status,
    Implementers,
    RequesterName,
    LaunchDate,
    Category,
    Efficiency,
    CostSaving,
    Satisfaction,
    Summary,
    ShortDescription,
    Duration,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Title => "title",
            CanonicalField::Background => "background",
            CanonicalField::Solution => "solution",
            CanonicalField::Features => "features",
            CanonicalField::EstimatedImpact => "estimatedImpact",
            CanonicalField::ActualImpact => "actualImpact",
            CanonicalField::EmpoweredDepartments => "empoweredDepartments",
            CanonicalField::Region => "region",
            CanonicalField::DemoVideo => "demoVideo",
            CanonicalField::ProjectLinks => "projectLinks",
            CanonicalField::Status => "status",
            CanonicalField::Implementers => "implementers",
            CanonicalField::RequesterName => "requesterName",
            CanonicalField::LaunchDate => "launchDate",
            CanonicalField::Category => "category",
            CanonicalField::Efficiency => "efficiency",
            CanonicalField::CostSaving => "costSaving",
            CanonicalField::Satisfaction => "satisfaction",
            CanonicalField::Summary => "summary",
            CanonicalField::ShortDescription => "shortDescription",
            CanonicalField::Duration => "duration",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 一级: 精确标签词典(中英双语,含飞书导出的截断变体)
// ==========================================
pub const EXACT_LABELS: &[(&str, CanonicalField)] = &[
    // 项目名称
    ("项目名称", CanonicalField::Title),
    ("项目名称（Project Name）", CanonicalField::Title),
    ("Project Name", CanonicalField::Title),
    ("项目标题", CanonicalField::Title),
    ("名称", CanonicalField::Title),
    ("title", CanonicalField::Title),
    // 产品说明 → 解决方案
    ("产品说明", CanonicalField::Solution),
    ("产品说明（Project Description）", CanonicalField::Solution),
    ("Project Description", CanonicalField::Solution),
    // 业务痛点 → 项目背景
    ("业务痛点", CanonicalField::Background),
    ("业务痛点（Business issues）", CanonicalField::Background),
    ("Business issues", CanonicalField::Background),
    ("项目背景", CanonicalField::Background),
    ("背景", CanonicalField::Background),
    ("background", CanonicalField::Background),
    // 核心功能点
    ("核心功能点", CanonicalField::Features),
    ("核心功能点（Key Features）", CanonicalField::Features),
    ("Key Features", CanonicalField::Features),
    ("核心功能", CanonicalField::Features),
    ("功能", CanonicalField::Features),
    ("主要功能", CanonicalField::Features),
    ("features", CanonicalField::Features),
    // 客户价值 → 实际效果
    ("客户价值", CanonicalField::ActualImpact),
    ("客户价值（Customer Value）", CanonicalField::ActualImpact),
    ("Customer Value", CanonicalField::ActualImpact),
    ("实际效果", CanonicalField::ActualImpact),
    ("效果", CanonicalField::ActualImpact),
    ("actualImpact", CanonicalField::ActualImpact),
    // 预估效果
    ("预估效果", CanonicalField::EstimatedImpact),
    ("预期效果", CanonicalField::EstimatedImpact),
    ("estimatedImpact", CanonicalField::EstimatedImpact),
    // 客户部门 → 赋能部门
    ("客户部门", CanonicalField::EmpoweredDepartments),
    ("客户部门（Department）", CanonicalField::EmpoweredDepartments),
    ("Department", CanonicalField::EmpoweredDepartments),
    ("赋能部门", CanonicalField::EmpoweredDepartments),
    ("赋能部门列表", CanonicalField::EmpoweredDepartments),
    ("empoweredDepartments", CanonicalField::EmpoweredDepartments),
    // 所属区域(含源数据里的拼写错误变体 Reigon)
    ("所属区域", CanonicalField::Region),
    ("所属区域（Reigon）", CanonicalField::Region),
    ("所属区域（Region）", CanonicalField::Region),
    ("Region", CanonicalField::Region),
    ("Reigon", CanonicalField::Region),
    // 项目Demo视频
    ("项目Demo视频", CanonicalField::DemoVideo),
    ("项目Demo视频（Demo）", CanonicalField::DemoVideo),
    ("Demo", CanonicalField::DemoVideo),
    // 项目链接
    ("项目链接及相关材料", CanonicalField::ProjectLinks),
    ("项目链接及相关材料（P）", CanonicalField::ProjectLinks),
    // 项目状态
    ("项目状态", CanonicalField::Status),
    ("项目状态（Status）", CanonicalField::Status),
    ("Status", CanonicalField::Status),
    ("状态", CanonicalField::Status),
    ("进度状态", CanonicalField::Status),
    ("status", CanonicalField::Status),
    // 项目负责人/实施人
    ("项目负责人", CanonicalField::Implementers),
    ("项目负责人（Project S）", CanonicalField::Implementers),
    ("Project S", CanonicalField::Implementers),
    ("负责人", CanonicalField::Implementers),
    ("开发人员", CanonicalField::Implementers),
    ("实施人", CanonicalField::Implementers),
    ("implementers", CanonicalField::Implementers),
    ("projectLead", CanonicalField::Implementers),
    // 需求方
    ("需求方", CanonicalField::RequesterName),
    ("需求方姓名", CanonicalField::RequesterName),
    ("提出人", CanonicalField::RequesterName),
    ("requesterName", CanonicalField::RequesterName),
    // 上线日期
    ("上线日期", CanonicalField::LaunchDate),
    ("上线时间", CanonicalField::LaunchDate),
    ("发布日期", CanonicalField::LaunchDate),
    ("launchDate", CanonicalField::LaunchDate),
    // 项目分类
    ("项目分类", CanonicalField::Category),
    ("分类", CanonicalField::Category),
    ("类别", CanonicalField::Category),
    ("category", CanonicalField::Category),
    // 效率提升
    ("效率提升", CanonicalField::Efficiency),
    ("效率", CanonicalField::Efficiency),
    ("efficiency", CanonicalField::Efficiency),
    // 成本节约
    ("成本节约", CanonicalField::CostSaving),
    ("成本", CanonicalField::CostSaving),
    ("节约成本", CanonicalField::CostSaving),
    ("costSaving", CanonicalField::CostSaving),
    // 满意度
    ("满意度", CanonicalField::Satisfaction),
    ("用户满意度", CanonicalField::Satisfaction),
    ("satisfaction", CanonicalField::Satisfaction),
    // 摘要/简介
    ("项目摘要", CanonicalField::Summary),
    ("摘要", CanonicalField::Summary),
    ("简介", CanonicalField::ShortDescription),
    ("项目简介", CanonicalField::ShortDescription),
    ("summary", CanonicalField::Summary),
    ("shortDescription", CanonicalField::ShortDescription),
    // 项目周期
    ("项目周期", CanonicalField::Duration),
    ("周期", CanonicalField::Duration),
    ("duration", CanonicalField::Duration),
];

// ==========================================
// 二级: 归一化子串规则(声明顺序即裁决顺序)
// ==========================================
// 红线: "项目名称"/"projectname" 必须先于泛化的 "status" 等;
//       首个包含命中的规则获胜
pub const SUBSTRING_RULES: &[(&str, CanonicalField)] = &[
    ("项目名称", CanonicalField::Title),
    ("projectname", CanonicalField::Title),
    ("产品说明", CanonicalField::Solution),
    ("projectdescription", CanonicalField::Solution),
    ("业务痛点", CanonicalField::Background),
    ("businessissues", CanonicalField::Background),
    ("核心功能", CanonicalField::Features),
    ("keyfeature", CanonicalField::Features),
    ("客户价值", CanonicalField::ActualImpact),
    ("customervalue", CanonicalField::ActualImpact),
    ("客户部门", CanonicalField::EmpoweredDepartments),
    ("department", CanonicalField::EmpoweredDepartments),
    ("所属区域", CanonicalField::Region),
    ("region", CanonicalField::Region),
    ("项目demo", CanonicalField::DemoVideo),
    ("demo", CanonicalField::DemoVideo),
    ("项目链接", CanonicalField::ProjectLinks),
    ("项目状态", CanonicalField::Status),
    ("status", CanonicalField::Status),
    ("项目负责人", CanonicalField::Implementers),
    ("projects", CanonicalField::Implementers),
];

fn exact_table() -> &'static HashMap<&'static str, CanonicalField> {
    static TABLE: OnceLock<HashMap<&'static str, CanonicalField>> = OnceLock::new();
    TABLE.get_or_init(|| EXACT_LABELS.iter().copied().collect())
}

/// 标签归一化: 小写 + 去除空白与中英文括号
fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '（' | '）' | '(' | ')'))
        .collect()
}

/// 将原始标签解析为规范字段
///
/// 未命中返回 None(未映射字段不是错误,由调用方收集诊断)
pub fn normalize(label: &str) -> Option<CanonicalField> {
    // 一级: 精确词典
    if let Some(field) = exact_table().get(label) {
        return Some(*field);
    }

    // 二级: 归一化子串,首个命中获胜
    let normalized = normalize_label(label);
    SUBSTRING_RULES
        .iter()
        .find(|(keyword, _)| normalized.contains(keyword))
        .map(|(_, field)| *field)
}

// ==========================================
// NormalizedRow - 归一化行
// ==========================================
/// 归一化结果: 规范字段表 + 未映射标签诊断
#[derive(Debug, Clone, Default)]
pub struct NormalizedRow {
    pub fields: HashMap<CanonicalField, String>,
    pub unmapped: Vec<String>,
}

impl NormalizedRow {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

/// 归一化整行: 丢弃未映射键与空值
///
/// 已知限制: 多个源标签映射到同一规范字段时(如"业务痛点"与
/// "项目背景"同指 background),同行内后处理者覆盖先处理者,
/// 无进一步仲裁
pub fn normalize_row(row: &HashMap<String, String>) -> NormalizedRow {
    let mut result = NormalizedRow::default();
    for (label, value) in row {
        match normalize(label) {
            Some(field) => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    result.fields.insert(field, trimmed.to_string());
                }
            }
            None => result.unmapped.push(label.clone()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_table_exhaustive() {
        // 精确词典逐条验证
        for (label, expected) in EXACT_LABELS {
            assert_eq!(
                normalize(label),
                Some(*expected),
                "精确标签 {} 映射错误",
                label
            );
        }
    }

    #[test]
    fn test_truncated_feishu_headers() {
        // 飞书导出常见的截断/带括号列名走二级子串匹配
        assert_eq!(
            normalize("项目名称（Project Na"),
            Some(CanonicalField::Title)
        );
        assert_eq!(
            normalize("核心功能点（Key Feat"),
            Some(CanonicalField::Features)
        );
        assert_eq!(
            normalize("项目负责人（Project"),
            Some(CanonicalField::Implementers)
        );
    }

    #[test]
    fn test_substring_first_match_wins() {
        // "项目状态xyz" 同时包含 "项目状态" 与 "status"?
        // 不包含 status;构造同时命中多条规则的标签验证声明顺序
        // "项目名称status" 同时命中 Title(第1条) 与 Status(第19条)
        assert_eq!(normalize("项目名称status"), Some(CanonicalField::Title));
        // "客户部门region" 命中 EmpoweredDepartments(第11条)先于 Region(第14条)
        assert_eq!(
            normalize("客户部门region"),
            Some(CanonicalField::EmpoweredDepartments)
        );
        // "项目demo" 先于泛化 "demo"
        assert_eq!(normalize("项目Demo链接"), Some(CanonicalField::DemoVideo));
    }

    #[test]
    fn test_normalize_strips_parens_and_whitespace() {
        assert_eq!(normalize_label("项目名称（Project Name）"), "项目名称projectname");
        assert_eq!(normalize("  项目名称  （xx）"), Some(CanonicalField::Title));
    }

    #[test]
    fn test_unmatched_label_dropped() {
        assert_eq!(normalize("备注"), None);
        assert_eq!(normalize("乱七八糟"), None);
    }

    #[test]
    fn test_normalize_row_drops_empty_and_collects_unmapped() {
        let mut row = HashMap::new();
        row.insert("项目名称".to_string(), "智能客服".to_string());
        row.insert("项目背景".to_string(), "   ".to_string()); // 空值丢弃
        row.insert("备注".to_string(), "随便写的".to_string()); // 未映射

        let normalized = normalize_row(&row);
        assert_eq!(normalized.get(CanonicalField::Title), Some("智能客服"));
        assert_eq!(normalized.get(CanonicalField::Background), None);
        assert_eq!(normalized.unmapped, vec!["备注".to_string()]);
    }
}
