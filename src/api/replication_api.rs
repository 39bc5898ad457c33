// ==========================================
// AI能力交易平台 - 部署申请接口
// ==========================================
// 端点形态: 创建 / 列表 / 状态推进 / AI 分析旁路
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::replication::{
    ReplicationApplication, ReplicationFilter, ReplicationRequest,
};
use crate::domain::types::ReplicationStatus;
use crate::engine::replication::{AnalysisOutcome, ReplicationEngine};
use crate::repository::ReplicationRepository;
use tracing::instrument;

pub struct ReplicationApi {
    engine: ReplicationEngine,
    replication_repo: ReplicationRepository,
}

impl ReplicationApi {
    pub fn new(engine: ReplicationEngine, replication_repo: ReplicationRepository) -> Self {
        Self {
            engine,
            replication_repo,
        }
    }

    /// 对已发布项目发起部署申请
    #[instrument(skip(self, application), fields(project_id, applicant = %application.applicant_name))]
    pub fn apply_replication(
        &self,
        project_id: i64,
        replicator_id: i64,
        application: &ReplicationApplication,
    ) -> ApiResult<ReplicationRequest> {
        Ok(self.engine.apply(project_id, replicator_id, application)?)
    }

    /// 列出部署申请(可按状态/项目过滤)
    pub fn list_replications(
        &self,
        filter: &ReplicationFilter,
    ) -> ApiResult<Vec<ReplicationRequest>> {
        Ok(self.replication_repo.list(filter)?)
    }

    /// 状态推进(APPLIED → APPROVED → DEPLOYED,单向逐级)
    pub fn update_replication_status(
        &self,
        replication_id: i64,
        status: ReplicationStatus,
    ) -> ApiResult<ReplicationRequest> {
        Ok(self.engine.update_status(replication_id, status)?)
    }

    /// 触发 AI 分析旁路(幂等;服务不可用时返回 Unavailable)
    pub async fn analyze_replication(&self, replication_id: i64) -> ApiResult<AnalysisOutcome> {
        Ok(self.engine.analyze(replication_id).await?)
    }
}
