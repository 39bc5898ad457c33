// ==========================================
// AI能力交易平台 - 项目接口
// ==========================================
// 职责: 前台提交 / 文档解析摄入 / 列表查询 / 审核操作
// 口径: 单条操作返回实体或带可读消息的类型化错误
// ==========================================

use crate::analysis::{
    parse_analysis_response, DocumentAnalysisService, DocumentParseOutcome, DEFAULT_PARSE_PROMPT,
};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::project::{Project, ProjectDeveloper, ProjectFilter, ProjectImpact};
use crate::domain::types::IngestSource;
use crate::engine::project_builder::{BuildOutcome, ProjectBuilder};
use crate::engine::review::{ReviewDecision, ReviewEngine};
use crate::importer::field_normalizer::{CanonicalField, NormalizedRow};
use crate::importer::value_coercer::{format_currency_per_year, format_percentage};
use crate::repository::ProjectRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// SubmitProjectRequest - 前台提交表单
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitProjectRequest {
    pub title: String,
    pub background: Option<String>,
    pub solution: Option<String>,
    pub features: Option<String>,
    pub estimated_impact: Option<String>,
    pub actual_impact: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
    pub empowered_departments: Option<String>,
    pub launch_date: Option<String>,
    /// 运营状态的源语言标签(如"生产中")
    pub status: Option<String>,
    /// 实施人姓名列表,第一人自动成为项目负责人
    pub implementers: Vec<String>,
    /// 关键效果指标(只填数字,后端补规范后缀)
    pub efficiency: Option<String>,
    pub cost_saving: Option<String>,
    pub satisfaction: Option<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
}

pub struct ProjectApi {
    builder: ProjectBuilder,
    review_engine: ReviewEngine,
    project_repo: ProjectRepository,
    analysis_service: Arc<dyn DocumentAnalysisService>,
}

impl ProjectApi {
    pub fn new(
        builder: ProjectBuilder,
        review_engine: ReviewEngine,
        project_repo: ProjectRepository,
        analysis_service: Arc<dyn DocumentAnalysisService>,
    ) -> Self {
        Self {
            builder,
            review_engine,
            project_repo,
            analysis_service,
        }
    }

    /// 前台表单提交(初始审核状态 PENDING)
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub fn submit_project(&self, request: SubmitProjectRequest) -> ApiResult<Project> {
        if request.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("项目名称不能为空".to_string()));
        }

        let images_json = to_url_json(&request.images);
        let row = submit_request_to_row(request);

        match self
            .builder
            .build_from_row(&row, IngestSource::UserSubmission)?
        {
            BuildOutcome::Created { project_id, .. } => {
                if images_json.is_some() {
                    self.project_repo
                        .update_media(project_id, images_json.as_deref(), None)?;
                }
                self.fetch_required(project_id)
            }
            BuildOutcome::Skipped { title } => Err(ApiError::BusinessRuleViolation(format!(
                "同名项目已存在: {}",
                title
            ))),
        }
    }

    /// 文档解析摄入: 自由文本 → 分析服务 → 规范字段 → PENDING 项目
    ///
    /// 分析服务的键名即规范字段名;响应提取失败返回类型化软错误
    #[instrument(skip(self, document_text, instruction))]
    pub async fn ingest_document(
        &self,
        document_text: &str,
        instruction: Option<&str>,
    ) -> ApiResult<Project> {
        if document_text.trim().is_empty() {
            return Err(ApiError::InvalidInput("文档内容不能为空".to_string()));
        }

        let prompt = instruction.unwrap_or(DEFAULT_PARSE_PROMPT);
        let response = self
            .analysis_service
            .analyze(document_text, Some(prompt))
            .await
            .map_err(|e| ApiError::AnalysisFailed(e.to_string()))?;

        let doc = match parse_analysis_response(&response) {
            DocumentParseOutcome::Parsed(doc) => doc,
            DocumentParseOutcome::ParseFailure { reason } => {
                return Err(ApiError::AnalysisFailed(reason));
            }
        };

        let row = doc.into_row();
        match self
            .builder
            .build_from_row(&row, IngestSource::DocumentParse)?
        {
            BuildOutcome::Created { project_id, title } => {
                info!(project_id, title = %title, "文档解析摄入成功");
                self.fetch_required(project_id)
            }
            BuildOutcome::Skipped { title } => Err(ApiError::BusinessRuleViolation(format!(
                "同名项目已存在: {}",
                title
            ))),
        }
    }

    /// 按条件列出项目
    pub fn list_projects(&self, filter: &ProjectFilter) -> ApiResult<Vec<Project>> {
        Ok(self.project_repo.list(filter)?)
    }

    /// 项目广场读路径: 仅审核通过的项目可见
    pub fn list_showcase(&self) -> ApiResult<Vec<Project>> {
        Ok(self.project_repo.list(&ProjectFilter::showcase())?)
    }

    pub fn get_project(&self, project_id: i64) -> ApiResult<Project> {
        self.fetch_required(project_id)
    }

    pub fn list_developers(&self, project_id: i64) -> ApiResult<Vec<ProjectDeveloper>> {
        Ok(self.project_repo.list_developers(project_id)?)
    }

    pub fn get_impact(&self, project_id: i64) -> ApiResult<Option<ProjectImpact>> {
        Ok(self.project_repo.find_impact(project_id)?)
    }

    /// 审核操作(PENDING → APPROVED | REJECTED)
    pub fn review_project(
        &self,
        project_id: i64,
        decision: ReviewDecision,
    ) -> ApiResult<Project> {
        Ok(self.review_engine.review(project_id, decision)?)
    }

    fn fetch_required(&self, project_id: i64) -> ApiResult<Project> {
        self.project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| ApiError::NotFound(format!("项目 ID {} 不存在", project_id)))
    }
}

/// 表单 → 规范字段行(关键效果指标在此补规范后缀)
fn submit_request_to_row(request: SubmitProjectRequest) -> NormalizedRow {
    let mut row = NormalizedRow::default();
    let mut put = |field: CanonicalField, value: Option<String>| {
        if let Some(v) = value {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                row.fields.insert(field, trimmed.to_string());
            }
        }
    };

    put(CanonicalField::Title, Some(request.title));
    put(CanonicalField::Background, request.background);
    put(CanonicalField::Solution, request.solution);
    put(CanonicalField::Features, request.features);
    put(CanonicalField::EstimatedImpact, request.estimated_impact);
    put(CanonicalField::ActualImpact, request.actual_impact);
    put(CanonicalField::ShortDescription, request.short_description);
    put(CanonicalField::Category, request.category);
    put(
        CanonicalField::EmpoweredDepartments,
        request.empowered_departments,
    );
    put(CanonicalField::LaunchDate, request.launch_date);
    put(CanonicalField::Status, request.status);
    if !request.implementers.is_empty() {
        put(
            CanonicalField::Implementers,
            Some(request.implementers.join("、")),
        );
    }
    put(
        CanonicalField::Efficiency,
        request.efficiency.as_deref().and_then(format_percentage),
    );
    put(
        CanonicalField::CostSaving,
        request
            .cost_saving
            .as_deref()
            .and_then(format_currency_per_year),
    );
    put(
        CanonicalField::Satisfaction,
        request.satisfaction.as_deref().and_then(format_percentage),
    );
    if !request.videos.is_empty() {
        put(CanonicalField::DemoVideo, Some(request.videos.join(",")));
    }
    row
}

fn to_url_json(urls: &[String]) -> Option<String> {
    if urls.is_empty() {
        return None;
    }
    serde_json::to_string(urls).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_to_row_formats_metrics() {
        let request = SubmitProjectRequest {
            title: "智能客服".to_string(),
            efficiency: Some("60".to_string()),
            cost_saving: Some("50".to_string()),
            satisfaction: Some("-3".to_string()),
            implementers: vec!["张三".to_string(), "李四".to_string()],
            ..Default::default()
        };
        let row = submit_request_to_row(request);
        assert_eq!(row.get(CanonicalField::Efficiency), Some("+60%"));
        assert_eq!(row.get(CanonicalField::CostSaving), Some("50/每年"));
        assert_eq!(row.get(CanonicalField::Satisfaction), Some("-3%"));
        assert_eq!(row.get(CanonicalField::Implementers), Some("张三、李四"));
    }

    #[test]
    fn test_submit_request_to_row_drops_blank_metrics() {
        let request = SubmitProjectRequest {
            title: "数据看板".to_string(),
            efficiency: Some("待定".to_string()), // 清洗后为空,丢弃
            ..Default::default()
        };
        let row = submit_request_to_row(request);
        assert_eq!(row.get(CanonicalField::Efficiency), None);
    }
}
