// ==========================================
// 端到端集成测试 - 批量导入完整流程
// ==========================================
// 测试目标: CSV 导入 → 字段归一化 → 实体解析 → 项目落库
// 覆盖范围: BulkProjectImporter + ProjectBuilder + EntityResolver
// ==========================================

mod test_helpers;

use ai_capability_hub::domain::types::{
    OperationalStatus, ReviewStatus, ROLE_ENGINEER, ROLE_PROJECT_LEAD,
};
use ai_capability_hub::importer::{BulkProjectImporter, CsvParser};
use ai_capability_hub::logging;
use ai_capability_hub::repository::{ProjectRepository, UserRepository};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

fn create_importer(conn: &Arc<Mutex<Connection>>) -> BulkProjectImporter {
    BulkProjectImporter::new(
        Box::new(CsvParser),
        test_helpers::build_project_builder(conn),
        ProjectRepository::from_connection(conn.clone()),
    )
}

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

// ==========================================
// 测试用例 1: 中文表头导入完整流程
// ==========================================

#[test]
fn test_e2e_csv_import_chinese_headers() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let importer = create_importer(&conn);

    let file = write_csv(
        "项目名称,项目负责人,项目状态,业务痛点,效率提升,上线日期,所属区域\n\
         智能客服,张三、李四,生产中,客服响应慢,+20%,2024年1月15日,华东\n\
         数据看板,王五,排期中,报表手工统计,,2024-03-01,\n",
    );

    let summary = importer.import_from_file(file.path()).unwrap();
    assert_eq!(summary.total_rows, 2);
    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 0);

    let project_repo = ProjectRepository::from_connection(conn.clone());
    let user_repo = UserRepository::from_connection(conn.clone());

    // 项目字段验证
    let project = project_repo.find_by_title("智能客服").unwrap().unwrap();
    assert_eq!(project.status, OperationalStatus::InProduction);
    // 批量导入为可信来源,直接 APPROVED
    assert_eq!(project.review_status, ReviewStatus::Approved);
    assert_eq!(project.background.as_deref(), Some("客服响应慢"));
    assert_eq!(
        project.launch_date,
        NaiveDate::from_ymd_opt(2024, 1, 15)
    );
    // 无显式分类,从区域派生
    assert_eq!(project.category, "华东项目");

    // 实施人验证: 第一人为负责人,其余为工程师
    let zhang_san = user_repo.find_by_name("张三").unwrap().unwrap();
    let li_si = user_repo.find_by_name("李四").unwrap().unwrap();
    assert_eq!(project.project_lead_id, zhang_san.id);

    let developers = project_repo.list_developers(project.id).unwrap();
    assert_eq!(developers.len(), 2);
    let lead = developers
        .iter()
        .find(|d| d.user_id == zhang_san.id)
        .unwrap();
    assert_eq!(lead.role, ROLE_PROJECT_LEAD);
    let engineer = developers.iter().find(|d| d.user_id == li_si.id).unwrap();
    assert_eq!(engineer.role, ROLE_ENGINEER);

    // 关键效果: 效率提升存在 → impact 记录创建
    let impact = project_repo.find_impact(project.id).unwrap().unwrap();
    assert_eq!(impact.efficiency.as_deref(), Some("+20%"));
    assert!(impact.cost_saving.is_none());

    // 第二行: 无效果指标 → 不创建 impact 记录
    let dashboard = project_repo.find_by_title("数据看板").unwrap().unwrap();
    assert_eq!(dashboard.status, OperationalStatus::Scheduled);
    assert!(project_repo.find_impact(dashboard.id).unwrap().is_none());
}

// ==========================================
// 测试用例 2: 重复导入幂等性
// ==========================================

#[test]
fn test_e2e_reimport_is_idempotent() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let importer = create_importer(&conn);

    let file = write_csv(
        "项目名称,项目负责人\n智能质检,赵六\n工单助手,钱七\n",
    );

    let first = importer.import_from_file(file.path()).unwrap();
    assert_eq!(first.success, 2);
    assert_eq!(first.skipped, 0);

    let user_repo = UserRepository::from_connection(conn.clone());
    let zhao_liu_id = user_repo.find_by_name("赵六").unwrap().unwrap().id;

    // 相同批次再跑一次: 全部按同名跳过
    let second = importer.import_from_file(file.path()).unwrap();
    assert_eq!(second.success, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(second.skipped, second.total_rows);

    // 用户不会重复创建,仍解析到同一条记录
    let zhao_liu_again = user_repo.find_by_name("赵六").unwrap().unwrap();
    assert_eq!(zhao_liu_again.id, zhao_liu_id);
}

// ==========================================
// 测试用例 3: 行级失败不中断批次
// ==========================================

#[test]
fn test_e2e_row_failure_does_not_abort_batch() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let importer = create_importer(&conn);

    // 第一行缺少项目名称(行级失败),第二行正常
    let file = write_csv(
        "项目名称,项目负责人,备注\n,张三,标题缺失的行\n语音外呼,李四,正常行\n",
    );

    let summary = importer.import_from_file(file.path()).unwrap();
    assert_eq!(summary.total_rows, 2);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);

    // 错误明细带行号(表头占第 1 行)
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].0, 2);
    assert!(summary.errors[0].1.contains("缺少项目名称"));

    // 未映射列名作为诊断上报
    assert!(summary
        .unmapped_labels
        .contains(&"备注".to_string()));

    // 后续行正常落库
    let project_repo = ProjectRepository::from_connection(conn.clone());
    assert!(project_repo.find_by_title("语音外呼").unwrap().is_some());
}

// ==========================================
// 测试用例 4: 批次级致命错误
// ==========================================

#[test]
fn test_e2e_file_level_errors() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let importer = create_importer(&conn);

    // 文件不存在
    let result = importer.import_from_file(std::path::Path::new("no_such_file.csv"));
    assert!(result.is_err());

    // 只有表头的空表
    let file = write_csv("项目名称,项目负责人\n");
    let result = importer.import_from_file(file.path());
    assert!(result.is_err());
}

// ==========================================
// 测试用例 5: 状态标签未命中时的批量导入默认值
// ==========================================

#[test]
fn test_e2e_unmapped_status_defaults_on_bulk_import() {
    logging::init_test();

    let conn = test_helpers::create_test_conn();
    let importer = create_importer(&conn);

    let file = write_csv("项目名称,项目状态\n知识库问答,奇怪状态\n");
    let summary = importer.import_from_file(file.path()).unwrap();
    assert_eq!(summary.success, 1);

    let project_repo = ProjectRepository::from_connection(conn.clone());
    let project = project_repo.find_by_title("知识库问答").unwrap().unwrap();
    assert_eq!(project.status, OperationalStatus::DeliveredDeployed);
}
