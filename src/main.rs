// ==========================================
// AI能力交易平台 - 命令行入口
// ==========================================
// 用法:
//   ai-capability-hub import [文件路径]
// 未给出文件路径时,使用数据目录下的默认文件(projects.xlsx)
// ==========================================

use ai_capability_hub::api::ImportApi;
use ai_capability_hub::config::ConfigManager;
use ai_capability_hub::engine::ProjectBuilder;
use ai_capability_hub::importer::{BulkProjectImporter, UniversalFileParser};
use ai_capability_hub::repository::{
    DepartmentRepository, ProjectRepository, UserRepository,
};
use ai_capability_hub::resolver::EntityResolver;
use ai_capability_hub::{db, logging};
use anyhow::Context;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 项目收录与流转引擎", ai_capability_hub::APP_NAME);
    tracing::info!("系统版本: {}", ai_capability_hub::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    let (command, file_arg) = match args.get(1).map(String::as_str) {
        None | Some("import") => ("import", args.get(2).cloned()),
        Some(other) => {
            eprintln!("未知命令: {}", other);
            eprintln!("用法: ai-capability-hub import [文件路径]");
            std::process::exit(2);
        }
    };

    let data_dir = default_data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("无法创建数据目录: {}", data_dir.display()))?;
    let db_path = data_dir.join("app.db");
    tracing::info!("使用数据库: {}", db_path.display());

    // 初始化数据库连接与 schema
    let conn = db::open_sqlite_connection(
        db_path
            .to_str()
            .context("数据库路径包含非法字符")?,
    )?;
    db::init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    match command {
        "import" => run_import(conn, data_dir, file_arg.as_deref().map(Path::new))?,
        _ => unreachable!(),
    }

    Ok(())
}

/// 组装导入链路并执行
fn run_import(
    conn: Arc<Mutex<Connection>>,
    data_dir: PathBuf,
    file_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = ConfigManager::from_connection(conn.clone());
    let email_domain = config.email_domain()?;

    let resolver = EntityResolver::new(
        DepartmentRepository::from_connection(conn.clone()),
        UserRepository::from_connection(conn.clone()),
    )
    .with_email_domain(email_domain);

    let builder = ProjectBuilder::new(
        resolver,
        ProjectRepository::from_connection(conn.clone()),
    );
    let importer = BulkProjectImporter::new(
        Box::new(UniversalFileParser),
        builder,
        ProjectRepository::from_connection(conn.clone()),
    );
    let import_api = ImportApi::new(importer, config, data_dir);

    let summary = import_api.import_projects(file_path)?;

    tracing::info!("==================================================");
    tracing::info!("导入完成 (批次: {})", summary.batch_id);
    tracing::info!("  成功: {} 条", summary.success);
    tracing::info!("  失败: {} 条", summary.failed);
    tracing::info!("  跳过: {} 条", summary.skipped);
    for (row, error) in &summary.errors {
        tracing::warn!("  行 {}: {}", row, error);
    }
    if !summary.unmapped_labels.is_empty() {
        tracing::warn!("  未映射列名: {}", summary.unmapped_labels.join(", "));
    }

    Ok(())
}

/// 默认数据目录(系统数据目录下的应用子目录)
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ai-capability-hub")
}
