// ==========================================
// AI能力交易平台 - 审核状态机
// ==========================================
// 状态: PENDING(初始) → APPROVED | REJECTED(均为终态)
// 红线: 仅 PENDING 可转换;终态项目的再次转换是显式错误,
//       不是静默重放;APPROVED 之外不改动任何字段
// ==========================================

use crate::domain::project::Project;
use crate::domain::types::ReviewStatus;
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::repository::ProjectRepository;
use tracing::info;

// ==========================================
// ReviewDecision - 审核决定
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve, // 通过(项目进入广场可见范围)
    Reject,  // 拒绝(本引擎不提供重新开启,需重新提交新项目)
}

impl ReviewDecision {
    pub fn target_status(&self) -> ReviewStatus {
        match self {
            ReviewDecision::Approve => ReviewStatus::Approved,
            ReviewDecision::Reject => ReviewStatus::Rejected,
        }
    }
}

pub struct ReviewEngine {
    project_repo: ProjectRepository,
}

impl ReviewEngine {
    pub fn new(project_repo: ProjectRepository) -> Self {
        Self { project_repo }
    }

    /// 执行审核转换
    ///
    /// 转换守卫: 当前状态必须为 PENDING;
    /// 副作用仅限 review_status 字段(APPROVED 后项目进入公开列表)
    pub fn review(&self, project_id: i64, decision: ReviewDecision) -> WorkflowResult<Project> {
        let project = self
            .project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("项目 ID {} 不存在", project_id)))?;

        let target = decision.target_status();
        if project.review_status != ReviewStatus::Pending {
            return Err(WorkflowError::InvalidStateTransition {
                from: project.review_status.to_string(),
                to: target.to_string(),
            });
        }

        self.project_repo
            .update_review_status(project_id, target)?;

        info!(
            project_id,
            title = %project.title,
            from = %project.review_status,
            to = %target,
            "项目审核转换"
        );

        // 重新读取以返回转换后的记录
        self.project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("项目 ID {} 不存在", project_id)))
    }
}
