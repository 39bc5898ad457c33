// ==========================================
// AI能力交易平台 - 部署申请领域模型
// ==========================================
// 部署申请: 业务部门对已发布项目提出的复用/部署请求
// 红线: DEPLOYED 后记录不可变更
// ==========================================

use crate::domain::types::ReplicationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ReplicationRequest - 部署申请记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationRequest {
    pub id: i64,
    pub project_id: i64,
    pub replicator_id: i64,   // 发起申请的用户
    pub department_id: i64,   // 申请方部门(按名称解析,无匹配时回退默认部门)

    // ===== 申请人联系信息 =====
    pub applicant_name: String,
    pub department: String, // 申请时填写的部门名称原文
    pub contact_phone: Option<String>,
    pub email: String,

    // ===== 申请内容 =====
    pub team_size: Option<String>,
    pub urgency: Urgency,
    pub target_launch_date: Option<String>,
    pub business_scenario: String, // 业务场景(必填)
    pub expected_goals: Option<String>,
    pub budget_range: Option<String>,
    pub additional_needs: Option<String>,

    // ===== 状态 =====
    pub status: ReplicationStatus,

    // ===== AI 分析附件(旁路,不影响状态机) =====
    pub ai_analysis: Option<String>,
    pub ai_analysis_at: Option<DateTime<Utc>>,

    // ===== 审计字段 =====
    pub applied_at: DateTime<Utc>,
    pub deployed_at: Option<DateTime<Utc>>,
}

// ==========================================
// ReplicationApplication - 申请表单
// ==========================================
// 对齐前台申请表单字段;business_scenario 为唯一必填长文本
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationApplication {
    pub applicant_name: String,
    pub department: String,
    pub contact_phone: Option<String>,
    pub email: String,
    pub team_size: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    pub target_launch_date: Option<String>,
    pub business_scenario: String,
    pub expected_goals: Option<String>,
    pub budget_range: Option<String>,
    pub additional_needs: Option<String>,
}

// ==========================================
// Urgency - 紧急程度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal, // 普通
    Urgent,    // 较急
    Emergency, // 紧急
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Urgent => "urgent",
            Urgency::Emergency => "emergency",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Urgency::Normal),
            "urgent" => Some(Urgency::Urgent),
            "emergency" => Some(Urgency::Emergency),
            _ => None,
        }
    }

    /// 提示词中的中文描述
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Normal => "普通",
            Urgency::Urgent => "较急",
            Urgency::Emergency => "紧急",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// ReplicationFilter - 列表查询条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReplicationFilter {
    pub status: Option<ReplicationStatus>,
    pub project_id: Option<i64>,
}
