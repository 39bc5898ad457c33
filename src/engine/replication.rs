// ==========================================
// AI能力交易平台 - 部署申请状态机
// ==========================================
// 状态: APPLIED(初始) → APPROVED → DEPLOYED,单向推进
// 红线: 禁止回退与跳级;DEPLOYED 后记录不可变更
// 旁路: AI 分析附件可在 APPLIED 之后任意时点执行,
//       不改变状态;服务失败降级,绝不污染状态机
// ==========================================

use crate::analysis::DocumentAnalysisService;
use crate::domain::project::Project;
use crate::domain::replication::{ReplicationApplication, ReplicationRequest};
use crate::domain::types::{ReplicationStatus, ReviewStatus};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::repository::{ProjectRepository, ReplicationRepository};
use crate::resolver::EntityResolver;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// AnalysisOutcome - 分析旁路结果
// ==========================================
// 软失败口径: 服务不可用时返回 Unavailable,不向上抛错
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// 分析完成并已落库(幂等覆盖旧分析)
    Completed {
        analysis: String,
        analyzed_at: chrono::DateTime<Utc>,
    },
    /// 分析不可用(服务未配置/超时/出错),状态机不受影响
    Unavailable { reason: String },
}

pub struct ReplicationEngine {
    replication_repo: ReplicationRepository,
    project_repo: ProjectRepository,
    resolver: EntityResolver,
    analysis_service: Arc<dyn DocumentAnalysisService>,
}

impl ReplicationEngine {
    pub fn new(
        replication_repo: ReplicationRepository,
        project_repo: ProjectRepository,
        resolver: EntityResolver,
        analysis_service: Arc<dyn DocumentAnalysisService>,
    ) -> Self {
        Self {
            replication_repo,
            project_repo,
            resolver,
            analysis_service,
        }
    }

    /// 创建部署申请(初始状态 APPLIED)
    ///
    /// 前置条件: 目标项目存在且审核状态为 APPROVED(广场可见);
    /// business_scenario 为必填项
    pub fn apply(
        &self,
        project_id: i64,
        replicator_id: i64,
        application: &ReplicationApplication,
    ) -> WorkflowResult<ReplicationRequest> {
        let project = self
            .project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("项目 ID {} 不存在", project_id)))?;

        if project.review_status != ReviewStatus::Approved {
            return Err(WorkflowError::BusinessRuleViolation(format!(
                "项目 \"{}\" 未通过审核,不可申请部署",
                project.title
            )));
        }

        if application.applicant_name.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "缺少申请人姓名".to_string(),
            ));
        }
        if application.business_scenario.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "缺少业务场景描述".to_string(),
            ));
        }

        // 申请方部门按名称解析,未命中回退默认部门
        let department = self
            .resolver
            .resolve_department_by_name(&application.department)?;

        let id = self.replication_repo.create(
            project_id,
            replicator_id,
            department.id,
            application,
        )?;

        info!(
            replication_id = id,
            project_id,
            applicant = %application.applicant_name,
            "创建部署申请"
        );

        self.find_required(id)
    }

    /// 状态推进(单向,逐级)
    ///
    /// 合法转换仅有 APPLIED→APPROVED 与 APPROVED→DEPLOYED;
    /// 其余一律拒绝为 InvalidStateTransition
    pub fn update_status(
        &self,
        replication_id: i64,
        target: ReplicationStatus,
    ) -> WorkflowResult<ReplicationRequest> {
        let request = self.find_required(replication_id)?;

        if request.status.next() != Some(target) {
            return Err(WorkflowError::InvalidStateTransition {
                from: request.status.to_string(),
                to: target.to_string(),
            });
        }

        let deployed_at = if target == ReplicationStatus::Deployed {
            Some(Utc::now())
        } else {
            None
        };
        self.replication_repo
            .update_status(replication_id, target, deployed_at)?;

        info!(
            replication_id,
            from = %request.status,
            to = %target,
            "部署申请状态推进"
        );

        self.find_required(replication_id)
    }

    /// AI 分析旁路
    ///
    /// 幂等: 重复执行覆盖上一次分析;
    /// 软失败: 服务错误降级为 Unavailable,状态与已有分析不动
    pub async fn analyze(&self, replication_id: i64) -> WorkflowResult<AnalysisOutcome> {
        let request = self.find_required(replication_id)?;
        let project = self
            .project_repo
            .find_by_id(request.project_id)?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("项目 ID {} 不存在", request.project_id))
            })?;

        let prompt = build_analysis_prompt(&request, &project);

        match self.analysis_service.analyze(&prompt, None).await {
            Ok(analysis) => {
                let analyzed_at = Utc::now();
                self.replication_repo
                    .set_analysis(replication_id, &analysis, analyzed_at)?;
                info!(replication_id, "部署申请 AI 分析完成");
                Ok(AnalysisOutcome::Completed {
                    analysis,
                    analyzed_at,
                })
            }
            Err(e) => {
                warn!(replication_id, error = %e, "分析服务不可用,降级处理");
                Ok(AnalysisOutcome::Unavailable {
                    reason: e.to_string(),
                })
            }
        }
    }

    fn find_required(&self, replication_id: i64) -> WorkflowResult<ReplicationRequest> {
        self.replication_repo
            .find_by_id(replication_id)?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("部署申请 ID {} 不存在", replication_id))
            })
    }
}

/// 从申请的结构化字段构建分析提示词
fn build_analysis_prompt(request: &ReplicationRequest, project: &Project) -> String {
    format!(
        r#"请分析以下项目部署申请,帮助管理者快速了解申请人的意图和需求:

项目名称:{title}
项目分类:{category}
项目简介:{description}

申请人:{applicant}
部门:{department}
紧急程度:{urgency}
目标上线日期:{target_date}

业务场景:
{scenario}

预期目标:
{goals}

预算范围:
{budget}

其他需求:
{needs}

请提供以下分析:
1. 业务场景分析:申请人希望用这个项目解决什么问题?
2. 预期目标评估:申请人的目标是否合理?
3. 紧急程度评估:是否需要优先处理?
4. 建议和注意事项:有什么需要注意的地方?

请用Markdown格式返回分析结果。"#,
        title = project.title,
        category = project.category,
        description = project.short_description.as_deref().unwrap_or("无"),
        applicant = request.applicant_name,
        department = request.department,
        urgency = request.urgency.label(),
        target_date = request.target_launch_date.as_deref().unwrap_or("未指定"),
        scenario = request.business_scenario,
        goals = request.expected_goals.as_deref().unwrap_or("未说明"),
        budget = request.budget_range.as_deref().unwrap_or("未指定"),
        needs = request.additional_needs.as_deref().unwrap_or("无"),
    )
}
