// ==========================================
// AI能力交易平台 - 规范项目构建器
// ==========================================
// 职责: 归一化字段 + 已解析实体 → Project 聚合落库
// 流程: 必填校验 → 标题查重 → 分类派生 → 实施人解析 → 落库
// 红线: 标题重复是幂等信号(跳过),不是错误;
//       单条失败不得影响批次内其他条目
// ==========================================

use crate::domain::project::{NewProject, ProjectImpact};
use crate::domain::types::{
    IngestSource, OperationalStatus, ROLE_ENGINEER, ROLE_PROJECT_LEAD,
};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::importer::field_normalizer::{CanonicalField, NormalizedRow};
use crate::importer::value_coercer::{parse_flexible_date, parse_name_list, parse_url_list};
use crate::repository::ProjectRepository;
use crate::resolver::EntityResolver;
use tracing::{debug, info};

/// 分类缺省值(无分类且无区域时)
pub const DEFAULT_CATEGORY: &str = "AI工具";

/// 项目简介截断长度(字符)
const SHORT_DESCRIPTION_MAX_CHARS: usize = 200;

// ==========================================
// BuildOutcome - 单条构建结果
// ==========================================
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// 新建成功
    Created { project_id: i64, title: String },
    /// 同名项目已存在,幂等跳过
    Skipped { title: String },
}

pub struct ProjectBuilder {
    resolver: EntityResolver,
    project_repo: ProjectRepository,
}

impl ProjectBuilder {
    pub fn new(resolver: EntityResolver, project_repo: ProjectRepository) -> Self {
        Self {
            resolver,
            project_repo,
        }
    }

    /// 从归一化行构建并持久化一个项目聚合
    ///
    /// 渠道差异: 批量导入(可信来源)直接 APPROVED,其余渠道 PENDING
    pub fn build_from_row(
        &self,
        row: &NormalizedRow,
        source: IngestSource,
    ) -> WorkflowResult<BuildOutcome> {
        // === 步骤 1: 必填校验 ===
        let title = row
            .get(CanonicalField::Title)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WorkflowError::ValidationError("缺少项目名称".to_string()))?
            .to_string();

        // === 步骤 2: 标题查重(重复导入的幂等性护栏) ===
        if self.project_repo.find_by_title(&title)?.is_some() {
            debug!(title = %title, "同名项目已存在,跳过");
            return Ok(BuildOutcome::Skipped { title });
        }

        // === 步骤 3: 解析默认实体 ===
        let department = self.resolver.resolve_default_department()?;
        let requester = self.resolver.resolve_default_user(&department)?;

        // === 步骤 4: 分类派生 ===
        let category = match row.get(CanonicalField::Category) {
            Some(c) => c.trim().to_string(),
            None => match row.get(CanonicalField::Region) {
                Some(region) => format!("{}项目", region.trim()),
                None => DEFAULT_CATEGORY.to_string(),
            },
        };

        // === 步骤 5: 运营状态映射 ===
        let status = match (row.get(CanonicalField::Status), source) {
            // 批量导入口径: 未命中标签默认"交付已投产"
            (Some(label), IngestSource::BulkImport) => {
                OperationalStatus::from_label_or_default(label)
            }
            (None, IngestSource::BulkImport) => OperationalStatus::DeliveredDeployed,
            // 其余渠道默认"需求已确认"
            (Some(label), _) => OperationalStatus::from_label(label)
                .unwrap_or(OperationalStatus::RequirementConfirmed),
            (None, _) => OperationalStatus::RequirementConfirmed,
        };

        // === 步骤 6: 实施人解析(第一人为负责人) ===
        let implementer_names = row
            .get(CanonicalField::Implementers)
            .map(parse_name_list)
            .unwrap_or_default();

        let mut project_lead_id = requester.id;
        let mut project_lead_department_id = Some(department.id);
        let mut implementer_users = Vec::new();

        for (idx, name) in implementer_names.iter().enumerate() {
            let Some(user) = self.resolver.resolve_user(name, &department)? else {
                continue;
            };
            if idx == 0 {
                project_lead_id = user.id;
                project_lead_department_id =
                    user.department_id.or(Some(department.id));
            }
            implementer_users.push(user);
        }

        // === 步骤 7: 媒体 URL 列表 ===
        let videos = row
            .get(CanonicalField::DemoVideo)
            .map(parse_url_list)
            .filter(|urls| !urls.is_empty())
            .map(|urls| serde_json::to_string(&urls).unwrap_or_else(|_| "[]".to_string()));

        // === 步骤 8: 落库 Project ===
        let project_id = self.project_repo.create(NewProject {
            title: title.clone(),
            background: owned(row.get(CanonicalField::Background)),
            solution: owned(row.get(CanonicalField::Solution)),
            features: owned(row.get(CanonicalField::Features)),
            estimated_impact: owned(row.get(CanonicalField::EstimatedImpact)),
            actual_impact: owned(row.get(CanonicalField::ActualImpact)),
            short_description: row
                .get(CanonicalField::ShortDescription)
                .or_else(|| row.get(CanonicalField::Summary))
                .map(|s| truncate_chars(s.trim(), SHORT_DESCRIPTION_MAX_CHARS)),
            category,
            empowered_departments: owned(row.get(CanonicalField::EmpoweredDepartments)),
            launch_date: row
                .get(CanonicalField::LaunchDate)
                .and_then(parse_flexible_date),
            status,
            review_status: source.initial_review_status(),
            requester_id: requester.id,
            requester_department_id: department.id,
            project_lead_id,
            project_lead_department_id,
            images: None,
            videos,
        })?;

        // === 步骤 9: 落库开发人员关联 ===
        for user in &implementer_users {
            let role = if user.id == project_lead_id {
                ROLE_PROJECT_LEAD
            } else {
                ROLE_ENGINEER
            };
            self.project_repo.insert_developer(project_id, user.id, role)?;
        }

        // === 步骤 10: 关键效果指标(至少一项存在才落库) ===
        let impact = ProjectImpact {
            project_id,
            efficiency: owned(row.get(CanonicalField::Efficiency)),
            cost_saving: owned(row.get(CanonicalField::CostSaving)),
            satisfaction: owned(row.get(CanonicalField::Satisfaction)),
        };
        if !impact.is_empty() {
            self.project_repo.insert_impact(&impact)?;
        }

        info!(
            project_id,
            title = %title,
            status = %status,
            implementers = implementer_users.len(),
            "创建项目"
        );
        Ok(BuildOutcome::Created { project_id, title })
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 按字符数截断(避免多字节边界截断)
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("智能客服平台", 4), "智能客服");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_owned_drops_blank() {
        assert_eq!(owned(Some("  ")), None);
        assert_eq!(owned(Some(" x ")), Some("x".to_string()));
        assert_eq!(owned(None), None);
    }
}
