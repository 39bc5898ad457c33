// ==========================================
// AI能力交易平台 - 项目领域模型
// ==========================================
// Project 为规范化后的唯一权威记录
// 红线: title 在活跃项目内唯一(由构建器跳过重复,非 DDL 约束)
// ==========================================

use crate::domain::types::{OperationalStatus, ReviewStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Project - 规范项目记录
// ==========================================
// 用途: 三条摄入渠道(表单/批量导入/文档解析)的共同落点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,

    // ===== 核心内容 =====
    pub title: String,                     // 项目名称(必填,活跃项目内唯一)
    pub background: Option<String>,        // 项目背景/业务痛点
    pub solution: Option<String>,          // 解决方案
    pub features: Option<String>,          // 核心功能(换行分隔的条目文本)
    pub estimated_impact: Option<String>,  // 预估效果
    pub actual_impact: Option<String>,     // 实际效果
    pub short_description: Option<String>, // 项目简介(截断至 200 字)

    // ===== 分类与归属 =====
    pub category: String,                       // 项目分类(缺省派生,见构建器)
    pub empowered_departments: Option<String>,  // 赋能部门(分隔符文本)
    pub launch_date: Option<NaiveDate>,         // 上线日期

    // ===== 状态 =====
    pub status: OperationalStatus, // 运营状态
    pub review_status: ReviewStatus, // 审核状态(广场可见性门闩)

    // ===== 人员关联 =====
    pub requester_id: i64,                      // 需求方用户
    pub requester_department_id: i64,           // 需求方部门
    pub project_lead_id: i64,                   // 项目负责人(实施人列表第一人)
    pub project_lead_department_id: Option<i64>, // 负责人部门

    // ===== 媒体资源(仅存 URL 列表,JSON 序列化) =====
    pub images: Option<String>,
    pub videos: Option<String>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建项目入参(id 由数据库分配)
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub background: Option<String>,
    pub solution: Option<String>,
    pub features: Option<String>,
    pub estimated_impact: Option<String>,
    pub actual_impact: Option<String>,
    pub short_description: Option<String>,
    pub category: String,
    pub empowered_departments: Option<String>,
    pub launch_date: Option<NaiveDate>,
    pub status: OperationalStatus,
    pub review_status: ReviewStatus,
    pub requester_id: i64,
    pub requester_department_id: i64,
    pub project_lead_id: i64,
    pub project_lead_department_id: Option<i64>,
    pub images: Option<String>,
    pub videos: Option<String>,
}

// ==========================================
// ProjectDeveloper - 项目开发人员关联
// ==========================================
// 不变量: 每个项目恰有一名"项目负责人",且负责人本身也占一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDeveloper {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: String, // "项目负责人" / "工程师"
}

// ==========================================
// ProjectImpact - 关键效果指标
// ==========================================
// 与 Project 1:1,三项指标至少一项存在时才创建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectImpact {
    pub project_id: i64,
    pub efficiency: Option<String>,   // 效率提升(如 "+20%")
    pub cost_saving: Option<String>,  // 成本节约(如 "10/每年")
    pub satisfaction: Option<String>, // 满意度(如 "+15%")
}

impl ProjectImpact {
    /// 三项指标是否全部为空(全空则不落库)
    pub fn is_empty(&self) -> bool {
        self.efficiency.is_none() && self.cost_saving.is_none() && self.satisfaction.is_none()
    }
}

// ==========================================
// ProjectFilter - 列表查询条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub status: Option<OperationalStatus>,
    pub review_status: Option<ReviewStatus>,
}

impl ProjectFilter {
    /// 项目广场读路径: 仅 APPROVED 可见
    pub fn showcase() -> Self {
        Self {
            review_status: Some(ReviewStatus::Approved),
            ..Default::default()
        }
    }
}

// ==========================================
// ImportSummary - 批量导入汇总
// ==========================================
// 口径: skipped = total - success - failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub total_rows: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    /// 行级错误明细 (行号, 原因)
    pub errors: Vec<(usize, String)>,
    /// 未映射的源列名(诊断信息,非错误)
    pub unmapped_labels: Vec<String>,
}

// ==========================================
// ImportBatch - 导入批次审计记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub total_rows: i32,
    pub success_rows: i32,
    pub fail_rows: i32,
    pub skipped_rows: i32,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}
