// ==========================================
// AI能力交易平台 - 部门仓储
// ==========================================
// 职责: departments 表数据访问
// 红线: 不含业务逻辑;get-or-create 语义在实体解析器中
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entity::Department;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct DepartmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DepartmentRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Department> {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row
                .get::<_, String>(3)?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
            updated_at: row
                .get::<_, String>(4)?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    const COLUMNS: &'static str = "id, name, description, created_at, updated_at";

    /// 按 id 升序取第一个部门(默认部门回退口径)
    pub fn find_first(&self) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM departments ORDER BY id ASC LIMIT 1",
            Self::COLUMNS
        );
        let result = conn
            .query_row(&sql, [], Self::map_row)
            .optional()?;
        Ok(result)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM departments WHERE id = ?1", Self::COLUMNS);
        let result = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(result)
    }

    /// 按名称精确查找(取最早创建的一条)
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM departments WHERE name = ?1 ORDER BY id ASC LIMIT 1",
            Self::COLUMNS
        );
        let result = conn
            .query_row(&sql, params![name], Self::map_row)
            .optional()?;
        Ok(result)
    }

    pub fn create(&self, name: &str, description: Option<&str>) -> RepositoryResult<Department> {
        let conn = self.get_conn()?;
        let now = Utc::now();
        conn.execute(
            r#"
            INSERT INTO departments (name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![name, description, now.to_rfc3339(), now.to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Department {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }
}
