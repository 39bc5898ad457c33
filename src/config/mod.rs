// ==========================================
// AI能力交易平台 - 配置层
// ==========================================
// 职责: 从 config_kv 表读取系统配置,未配置时使用内置默认值
// 红线: 只读接口与写入接口分离;不含业务逻辑
// ==========================================

use crate::analysis::client::DEFAULT_ANALYSIS_TIMEOUT_MS;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::resolver::DEFAULT_EMAIL_DOMAIN;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 默认导入文件名(数据目录下)
pub const DEFAULT_IMPORT_FILE: &str = "projects.xlsx";

// ===== 配置键 =====
const KEY_IMPORT_FILE: &str = "import.default_file";
const KEY_ANALYSIS_ENDPOINT: &str = "analysis.endpoint";
const KEY_ANALYSIS_TIMEOUT_MS: &str = "analysis.timeout_ms";
const KEY_EMAIL_DOMAIN: &str = "resolver.email_domain";

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取字符串配置(未配置返回 None)
    pub fn get_string(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }

    /// 写入字符串配置(upsert)
    pub fn set_string(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    // ===== 类型化读取(带默认值) =====

    /// 批量导入的默认文件名
    pub fn default_import_file(&self) -> RepositoryResult<String> {
        Ok(self
            .get_string(KEY_IMPORT_FILE)?
            .unwrap_or_else(|| DEFAULT_IMPORT_FILE.to_string()))
    }

    /// 分析服务地址(未配置返回 None,相关功能降级)
    pub fn analysis_endpoint(&self) -> RepositoryResult<Option<String>> {
        self.get_string(KEY_ANALYSIS_ENDPOINT)
    }

    /// 分析服务请求超时(毫秒)
    pub fn analysis_timeout_ms(&self) -> RepositoryResult<u64> {
        let value = self
            .get_string(KEY_ANALYSIS_TIMEOUT_MS)?
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_ANALYSIS_TIMEOUT_MS);
        Ok(value)
    }

    /// 占位账号合成邮箱的域名
    pub fn email_domain(&self) -> RepositoryResult<String> {
        Ok(self
            .get_string(KEY_EMAIL_DOMAIN)?
            .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string()))
    }
}
