// ==========================================
// 集成测试 - 审核与部署申请状态机
// ==========================================
// 测试目标: 状态转换守卫 / 单向推进 / AI 分析旁路降级
// 覆盖范围: ReviewEngine + ReplicationEngine + ProjectApi
// ==========================================

mod test_helpers;

use ai_capability_hub::analysis::DocumentAnalysisService;
use ai_capability_hub::api::{ApiError, ProjectApi};
use ai_capability_hub::domain::replication::{ReplicationApplication, Urgency};
use ai_capability_hub::domain::types::{
    IngestSource, OperationalStatus, ReplicationStatus, ReviewStatus,
};
use ai_capability_hub::engine::{
    AnalysisOutcome, BuildOutcome, ReplicationEngine, ReviewDecision, ReviewEngine, WorkflowError,
};
use ai_capability_hub::importer::{normalize_row, NormalizedRow};
use ai_capability_hub::logging;
use ai_capability_hub::repository::{ProjectRepository, ReplicationRepository};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// 测试辅助
// ==========================================

/// 造一行只有标题与负责人的归一化数据
fn minimal_row(title: &str) -> NormalizedRow {
    let mut raw = HashMap::new();
    raw.insert("项目名称".to_string(), title.to_string());
    raw.insert("项目负责人".to_string(), "张三".to_string());
    normalize_row(&raw)
}

/// 落一个指定渠道的项目,返回项目 ID
fn seed_project(conn: &Arc<Mutex<Connection>>, title: &str, source: IngestSource) -> i64 {
    let builder = test_helpers::build_project_builder(conn);
    match builder.build_from_row(&minimal_row(title), source).unwrap() {
        BuildOutcome::Created { project_id, .. } => project_id,
        BuildOutcome::Skipped { .. } => panic!("种子项目不应被跳过"),
    }
}

fn build_replication_engine(
    conn: &Arc<Mutex<Connection>>,
    analysis: Arc<dyn DocumentAnalysisService>,
) -> ReplicationEngine {
    ReplicationEngine::new(
        ReplicationRepository::from_connection(conn.clone()),
        ProjectRepository::from_connection(conn.clone()),
        test_helpers::build_resolver(conn),
        analysis,
    )
}

fn sample_application() -> ReplicationApplication {
    ReplicationApplication {
        applicant_name: "王五".to_string(),
        department: "技术部".to_string(),
        contact_phone: Some("138-1234-5678".to_string()),
        email: "wangwu@example.com".to_string(),
        team_size: Some("5-10人".to_string()),
        urgency: Urgency::Urgent,
        target_launch_date: Some("2026-12-31".to_string()),
        business_scenario: "我们需要这个项目来解决客服排队问题".to_string(),
        expected_goals: Some("提升效率30%".to_string()),
        budget_range: None,
        additional_needs: Some("需要培训支持".to_string()),
    }
}

// ==========================================
// 审核状态机
// ==========================================

#[test]
fn test_review_pending_to_approved() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let project_id = seed_project(&conn, "智能客服", IngestSource::UserSubmission);
    let engine = ReviewEngine::new(ProjectRepository::from_connection(conn.clone()));

    // 前台提交的项目初始为 PENDING
    let repo = ProjectRepository::from_connection(conn.clone());
    let before = repo.find_by_id(project_id).unwrap().unwrap();
    assert_eq!(before.review_status, ReviewStatus::Pending);

    let approved = engine.review(project_id, ReviewDecision::Approve).unwrap();
    assert_eq!(approved.review_status, ReviewStatus::Approved);
    // 审核只动 review_status,运营状态不变
    assert_eq!(approved.status, before.status);
}

#[test]
fn test_review_terminal_state_rejects_second_transition() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let project_id = seed_project(&conn, "数据看板", IngestSource::UserSubmission);
    let engine = ReviewEngine::new(ProjectRepository::from_connection(conn.clone()));

    engine.review(project_id, ReviewDecision::Reject).unwrap();

    // 终态项目不可再转换,且错误类型可区分
    let err = engine
        .review(project_id, ReviewDecision::Approve)
        .unwrap_err();
    match err {
        WorkflowError::InvalidStateTransition { from, to } => {
            assert_eq!(from, "REJECTED");
            assert_eq!(to, "APPROVED");
        }
        other => panic!("期望 InvalidStateTransition,实际 {:?}", other),
    }
}

#[test]
fn test_review_missing_project() {
    let conn = test_helpers::create_test_conn();
    let engine = ReviewEngine::new(ProjectRepository::from_connection(conn.clone()));
    let err = engine.review(9999, ReviewDecision::Approve).unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound(_)));
}

// ==========================================
// 部署申请状态机
// ==========================================

#[test]
fn test_replication_full_lifecycle() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    // 批量导入渠道直接 APPROVED,可发起申请
    let project_id = seed_project(&conn, "智能质检", IngestSource::BulkImport);
    let engine = build_replication_engine(&conn, test_helpers::StubAnalysisService::unavailable());

    let request = engine
        .apply(project_id, 1, &sample_application())
        .unwrap();
    assert_eq!(request.status, ReplicationStatus::Applied);
    assert!(request.deployed_at.is_none());

    // APPLIED → APPROVED
    let approved = engine
        .update_status(request.id, ReplicationStatus::Approved)
        .unwrap();
    assert_eq!(approved.status, ReplicationStatus::Approved);

    // APPROVED → DEPLOYED,部署时间落库
    let deployed = engine
        .update_status(request.id, ReplicationStatus::Deployed)
        .unwrap();
    assert_eq!(deployed.status, ReplicationStatus::Deployed);
    assert!(deployed.deployed_at.is_some());
}

#[test]
fn test_replication_rejects_skip_and_backward() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let project_id = seed_project(&conn, "工单助手", IngestSource::BulkImport);
    let engine = build_replication_engine(&conn, test_helpers::StubAnalysisService::unavailable());

    let request = engine
        .apply(project_id, 1, &sample_application())
        .unwrap();

    // 跳级 APPLIED → DEPLOYED 拒绝
    let err = engine
        .update_status(request.id, ReplicationStatus::Deployed)
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidStateTransition { .. }
    ));

    // 正常推进到终态
    engine
        .update_status(request.id, ReplicationStatus::Approved)
        .unwrap();
    engine
        .update_status(request.id, ReplicationStatus::Deployed)
        .unwrap();

    // 回退 DEPLOYED → APPROVED 拒绝
    let err = engine
        .update_status(request.id, ReplicationStatus::Approved)
        .unwrap_err();
    match err {
        WorkflowError::InvalidStateTransition { from, to } => {
            assert_eq!(from, "DEPLOYED");
            assert_eq!(to, "APPROVED");
        }
        other => panic!("期望 InvalidStateTransition,实际 {:?}", other),
    }
}

#[test]
fn test_replication_requires_approved_project() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    // 前台提交的项目尚未审核,不可申请部署
    let project_id = seed_project(&conn, "知识库问答", IngestSource::UserSubmission);
    let engine = build_replication_engine(&conn, test_helpers::StubAnalysisService::unavailable());

    let err = engine
        .apply(project_id, 1, &sample_application())
        .unwrap_err();
    assert!(matches!(err, WorkflowError::BusinessRuleViolation(_)));
}

#[test]
fn test_replication_requires_business_scenario() {
    let conn = test_helpers::create_test_conn();
    let project_id = seed_project(&conn, "语音外呼", IngestSource::BulkImport);
    let engine = build_replication_engine(&conn, test_helpers::StubAnalysisService::unavailable());

    let mut application = sample_application();
    application.business_scenario = "  ".to_string();
    let err = engine
        .apply(project_id, 1, &application)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ValidationError(_)));
}

// ==========================================
// AI 分析旁路
// ==========================================

#[tokio::test]
async fn test_analysis_attachment_stores_and_overwrites() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let project_id = seed_project(&conn, "合同审查", IngestSource::BulkImport);
    let engine = build_replication_engine(
        &conn,
        test_helpers::StubAnalysisService::returning("# 申请分析报告\n\n业务场景合理。"),
    );

    let request = engine
        .apply(project_id, 1, &sample_application())
        .unwrap();

    let outcome = engine.analyze(request.id).await.unwrap();
    match outcome {
        AnalysisOutcome::Completed { analysis, .. } => {
            assert!(analysis.contains("申请分析报告"));
        }
        AnalysisOutcome::Unavailable { reason } => panic!("分析应成功,实际: {}", reason),
    }

    // 附件落库,状态不变
    let repo = ReplicationRepository::from_connection(conn.clone());
    let stored = repo.find_by_id(request.id).unwrap().unwrap();
    assert!(stored.ai_analysis.is_some());
    assert!(stored.ai_analysis_at.is_some());
    assert_eq!(stored.status, ReplicationStatus::Applied);

    // 幂等: 重跑覆盖旧分析,仍然成功
    let second = engine.analyze(request.id).await.unwrap();
    assert!(matches!(second, AnalysisOutcome::Completed { .. }));
}

#[tokio::test]
async fn test_analysis_failure_degrades_without_corrupting_state() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let project_id = seed_project(&conn, "简历筛选", IngestSource::BulkImport);
    let engine = build_replication_engine(&conn, test_helpers::StubAnalysisService::unavailable());

    let request = engine
        .apply(project_id, 1, &sample_application())
        .unwrap();
    engine
        .update_status(request.id, ReplicationStatus::Approved)
        .unwrap();

    // 服务超时 → 软失败,不向上抛错
    let outcome = engine.analyze(request.id).await.unwrap();
    match outcome {
        AnalysisOutcome::Unavailable { reason } => assert!(reason.contains("超时")),
        AnalysisOutcome::Completed { .. } => panic!("分析应不可用"),
    }

    // 状态机不受影响,分析附件保持为空
    let repo = ReplicationRepository::from_connection(conn.clone());
    let stored = repo.find_by_id(request.id).unwrap().unwrap();
    assert_eq!(stored.status, ReplicationStatus::Approved);
    assert!(stored.ai_analysis.is_none());
}

// ==========================================
// 文档解析摄入渠道
// ==========================================

#[tokio::test]
async fn test_ingest_document_creates_pending_project() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let response = r#"解析结果:
```json
{
  "name": "会议纪要助手",
  "implementers": ["张三", "李四"],
  "background": "会议记录整理耗时",
  "status": "生产中",
  "categories": ["创作"],
  "departments": ["行政部"],
  "efficiency": "+40%"
}
```"#;
    let api = ProjectApi::new(
        test_helpers::build_project_builder(&conn),
        ReviewEngine::new(ProjectRepository::from_connection(conn.clone())),
        ProjectRepository::from_connection(conn.clone()),
        test_helpers::StubAnalysisService::returning(response),
    );

    let project = api
        .ingest_document("昨天开会讨论了会议纪要助手项目……", None)
        .await
        .unwrap();

    assert_eq!(project.title, "会议纪要助手");
    // 文档解析渠道进入 PENDING 等待审核
    assert_eq!(project.review_status, ReviewStatus::Pending);
    assert_eq!(project.status, OperationalStatus::InProduction);
    assert_eq!(project.category, "创作");
    assert_eq!(project.empowered_departments.as_deref(), Some("行政部"));

    let repo = ProjectRepository::from_connection(conn.clone());
    let impact = repo.find_impact(project.id).unwrap().unwrap();
    assert_eq!(impact.efficiency.as_deref(), Some("+40%"));
}

#[tokio::test]
async fn test_ingest_document_service_failure_is_soft() {
    let conn = test_helpers::create_test_conn();
    let api = ProjectApi::new(
        test_helpers::build_project_builder(&conn),
        ReviewEngine::new(ProjectRepository::from_connection(conn.clone())),
        ProjectRepository::from_connection(conn.clone()),
        test_helpers::StubAnalysisService::unavailable(),
    );

    let err = api.ingest_document("随便一段文档", None).await.unwrap_err();
    assert!(matches!(err, ApiError::AnalysisFailed(_)));

    // 空文档是输入校验错误,不触发外部调用
    let err = api.ingest_document("   ", None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_ingest_document_malformed_response() {
    let conn = test_helpers::create_test_conn();
    let api = ProjectApi::new(
        test_helpers::build_project_builder(&conn),
        ReviewEngine::new(ProjectRepository::from_connection(conn.clone())),
        ProjectRepository::from_connection(conn.clone()),
        test_helpers::StubAnalysisService::returning("服务开小差了,没有结构化输出"),
    );

    let err = api.ingest_document("一段文档", None).await.unwrap_err();
    assert!(matches!(err, ApiError::AnalysisFailed(_)));
}
