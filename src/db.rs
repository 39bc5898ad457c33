// ==========================================
// AI能力交易平台 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为(外键/忙等超时)
// - 提供幂等的建表入口,库/测试共用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout(毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema 版本
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema(幂等,CREATE TABLE IF NOT EXISTS)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS departments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            department_id INTEGER REFERENCES departments(id),
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'USER',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            background TEXT,
            solution TEXT,
            features TEXT,
            estimated_impact TEXT,
            actual_impact TEXT,
            short_description TEXT,
            category TEXT NOT NULL,
            empowered_departments TEXT,
            launch_date TEXT,
            status TEXT NOT NULL,
            review_status TEXT NOT NULL,
            requester_id INTEGER NOT NULL REFERENCES users(id),
            requester_department_id INTEGER NOT NULL REFERENCES departments(id),
            project_lead_id INTEGER NOT NULL REFERENCES users(id),
            project_lead_department_id INTEGER REFERENCES departments(id),
            images TEXT,
            videos TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_projects_title ON projects(title);
        CREATE INDEX IF NOT EXISTS idx_projects_review_status ON projects(review_status);

        CREATE TABLE IF NOT EXISTS project_developers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id),
            role TEXT NOT NULL,
            UNIQUE(project_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS project_impacts (
            project_id INTEGER PRIMARY KEY REFERENCES projects(id) ON DELETE CASCADE,
            efficiency TEXT,
            cost_saving TEXT,
            satisfaction TEXT
        );

        CREATE TABLE IF NOT EXISTS replication_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id),
            replicator_id INTEGER NOT NULL REFERENCES users(id),
            department_id INTEGER NOT NULL REFERENCES departments(id),
            applicant_name TEXT NOT NULL,
            department TEXT NOT NULL,
            contact_phone TEXT,
            email TEXT NOT NULL,
            team_size TEXT,
            urgency TEXT NOT NULL DEFAULT 'normal',
            target_launch_date TEXT,
            business_scenario TEXT NOT NULL,
            expected_goals TEXT,
            budget_range TEXT,
            additional_needs TEXT,
            status TEXT NOT NULL DEFAULT 'APPLIED',
            ai_analysis TEXT,
            ai_analysis_at TEXT,
            applied_at TEXT NOT NULL,
            deployed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_replications_status ON replication_requests(status);

        CREATE TABLE IF NOT EXISTS import_batches (
            batch_id TEXT PRIMARY KEY,
            file_name TEXT,
            total_rows INTEGER NOT NULL,
            success_rows INTEGER NOT NULL,
            fail_rows INTEGER NOT NULL,
            skipped_rows INTEGER NOT NULL,
            imported_at TEXT NOT NULL,
            elapsed_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
