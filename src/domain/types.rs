// ==========================================
// AI能力交易平台 - 领域类型定义
// ==========================================
// 状态体系: 运营状态 / 审核状态 / 部署申请状态
// 红线: 标签映射表为兼容契约,不得增删改
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 运营状态 (Operational Status)
// ==========================================
// 项目在真实世界的交付阶段,独立于审核状态
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalStatus {
    RequirementConfirmed, // 需求已确认
    Scheduled,            // 排期中
    InProduction,         // 生产中
    DeliveredNotDeployed, // 交付未投产
    DeliveredDeployed,    // 交付已投产
}

/// 中英文状态标签 → 枚举映射表(兼容契约,逐条对齐源数据)
pub const STATUS_LABELS: &[(&str, OperationalStatus)] = &[
    ("需求已确认", OperationalStatus::RequirementConfirmed),
    ("排期中", OperationalStatus::Scheduled),
    ("生产中", OperationalStatus::InProduction),
    ("交付未投产", OperationalStatus::DeliveredNotDeployed),
    ("交付已投产", OperationalStatus::DeliveredDeployed),
    ("已完成", OperationalStatus::DeliveredDeployed),
    ("进行中", OperationalStatus::InProduction),
    ("规划中", OperationalStatus::Scheduled),
    ("Completed", OperationalStatus::DeliveredDeployed),
    ("In Progress", OperationalStatus::InProduction),
    ("Planning", OperationalStatus::Scheduled),
    ("Done", OperationalStatus::DeliveredDeployed),
];

impl OperationalStatus {
    /// 按源标签查表
    pub fn from_label(label: &str) -> Option<Self> {
        STATUS_LABELS
            .iter()
            .find(|(l, _)| *l == label.trim())
            .map(|(_, s)| *s)
    }

    /// 批量导入口径: 未命中标签默认为"交付已投产"
    pub fn from_label_or_default(label: &str) -> Self {
        Self::from_label(label).unwrap_or(OperationalStatus::DeliveredDeployed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalStatus::RequirementConfirmed => "REQUIREMENT_CONFIRMED",
            OperationalStatus::Scheduled => "SCHEDULED",
            OperationalStatus::InProduction => "IN_PRODUCTION",
            OperationalStatus::DeliveredNotDeployed => "DELIVERED_NOT_DEPLOYED",
            OperationalStatus::DeliveredDeployed => "DELIVERED_DEPLOYED",
        }
    }

    /// 从数据库存储值解析
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "REQUIREMENT_CONFIRMED" => Some(OperationalStatus::RequirementConfirmed),
            "SCHEDULED" => Some(OperationalStatus::Scheduled),
            "IN_PRODUCTION" => Some(OperationalStatus::InProduction),
            "DELIVERED_NOT_DEPLOYED" => Some(OperationalStatus::DeliveredNotDeployed),
            "DELIVERED_DEPLOYED" => Some(OperationalStatus::DeliveredDeployed),
            _ => None,
        }
    }
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 审核状态 (Review Status)
// ==========================================
// 红线: APPROVED 是项目广场唯一可见状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,  // 待审核(新建项目初始状态)
    Approved, // 审核通过
    Rejected, // 审核拒绝
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::Approved => "APPROVED",
            ReviewStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ReviewStatus::Pending),
            "APPROVED" => Some(ReviewStatus::Approved),
            "REJECTED" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }

    /// 是否为终态(终态项目不可再次审核)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 部署申请状态 (Replication Status)
// ==========================================
// 红线: 单向推进 APPLIED → APPROVED → DEPLOYED,禁止回退/跳级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationStatus {
    Applied,  // 已申请
    Approved, // 已批准
    Deployed, // 已部署(终态,记录不可再变更)
}

impl ReplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationStatus::Applied => "APPLIED",
            ReplicationStatus::Approved => "APPROVED",
            ReplicationStatus::Deployed => "DEPLOYED",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "APPLIED" => Some(ReplicationStatus::Applied),
            "APPROVED" => Some(ReplicationStatus::Approved),
            "DEPLOYED" => Some(ReplicationStatus::Deployed),
            _ => None,
        }
    }

    /// 唯一合法的下一状态(终态返回 None)
    pub fn next(&self) -> Option<Self> {
        match self {
            ReplicationStatus::Applied => Some(ReplicationStatus::Approved),
            ReplicationStatus::Approved => Some(ReplicationStatus::Deployed),
            ReplicationStatus::Deployed => None,
        }
    }
}

impl fmt::Display for ReplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 数据来源渠道 (Ingest Source)
// ==========================================
// 唯一的渠道差异: 批量导入为可信来源,直接 APPROVED;
// 其余渠道一律进入 PENDING 等待人工审核
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestSource {
    BulkImport,     // Excel/CSV 批量导入
    UserSubmission, // 前台表单提交
    DocumentParse,  // 文档解析(外部分析服务)
}

impl IngestSource {
    /// 该渠道创建项目的初始审核状态
    pub fn initial_review_status(&self) -> ReviewStatus {
        match self {
            IngestSource::BulkImport => ReviewStatus::Approved,
            IngestSource::UserSubmission | IngestSource::DocumentParse => ReviewStatus::Pending,
        }
    }
}

// ==========================================
// 开发者角色标签
// ==========================================
// 约定: 实施人列表第一人为负责人,其余为工程师
pub const ROLE_PROJECT_LEAD: &str = "项目负责人";
pub const ROLE_ENGINEER: &str = "工程师";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_table_exhaustive() {
        // 标签映射表逐条验证(兼容契约)
        let expectations: &[(&str, OperationalStatus)] = &[
            ("需求已确认", OperationalStatus::RequirementConfirmed),
            ("排期中", OperationalStatus::Scheduled),
            ("生产中", OperationalStatus::InProduction),
            ("交付未投产", OperationalStatus::DeliveredNotDeployed),
            ("交付已投产", OperationalStatus::DeliveredDeployed),
            ("已完成", OperationalStatus::DeliveredDeployed),
            ("进行中", OperationalStatus::InProduction),
            ("规划中", OperationalStatus::Scheduled),
            ("Completed", OperationalStatus::DeliveredDeployed),
            ("In Progress", OperationalStatus::InProduction),
            ("Planning", OperationalStatus::Scheduled),
            ("Done", OperationalStatus::DeliveredDeployed),
        ];
        for (label, expected) in expectations {
            assert_eq!(
                OperationalStatus::from_label(label),
                Some(*expected),
                "标签 {} 映射错误",
                label
            );
        }
    }

    #[test]
    fn test_status_unmapped_defaults_to_delivered_deployed() {
        assert_eq!(OperationalStatus::from_label("未知状态"), None);
        assert_eq!(
            OperationalStatus::from_label_or_default("未知状态"),
            OperationalStatus::DeliveredDeployed
        );
    }

    #[test]
    fn test_status_db_roundtrip() {
        for (_, status) in STATUS_LABELS {
            assert_eq!(
                OperationalStatus::from_db_str(status.as_str()),
                Some(*status)
            );
        }
    }

    #[test]
    fn test_replication_status_next() {
        assert_eq!(
            ReplicationStatus::Applied.next(),
            Some(ReplicationStatus::Approved)
        );
        assert_eq!(
            ReplicationStatus::Approved.next(),
            Some(ReplicationStatus::Deployed)
        );
        assert_eq!(ReplicationStatus::Deployed.next(), None);
    }

    #[test]
    fn test_review_terminal() {
        assert!(!ReviewStatus::Pending.is_terminal());
        assert!(ReviewStatus::Approved.is_terminal());
        assert!(ReviewStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_ingest_source_review_status() {
        assert_eq!(
            IngestSource::BulkImport.initial_review_status(),
            ReviewStatus::Approved
        );
        assert_eq!(
            IngestSource::UserSubmission.initial_review_status(),
            ReviewStatus::Pending
        );
        assert_eq!(
            IngestSource::DocumentParse.initial_review_status(),
            ReviewStatus::Pending
        );
    }
}
