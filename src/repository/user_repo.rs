// ==========================================
// AI能力交易平台 - 用户仓储
// ==========================================
// 职责: users 表数据访问
// 红线: 不含业务逻辑;姓名去重口径由实体解析器负责
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entity::{NewUser, User, UserRole};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
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

    const COLUMNS: &'static str =
        "id, name, email, department_id, password_hash, role, created_at, updated_at";

    fn map_row(row: &Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(5)?;
        let role = UserRole::from_db_str(&role_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("非法角色值: {}", role_str).into(),
            )
        })?;
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            department_id: row.get(3)?,
            password_hash: row.get(4)?,
            role,
            created_at: row
                .get::<_, String>(6)?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
            updated_at: row
                .get::<_, String>(7)?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// 按 id 升序取第一个用户(默认需求方回退口径)
    pub fn find_first(&self) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users ORDER BY id ASC LIMIT 1", Self::COLUMNS);
        let result = conn.query_row(&sql, [], Self::map_row).optional()?;
        Ok(result)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users WHERE id = ?1", Self::COLUMNS);
        let result = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(result)
    }

    /// 按姓名精确查找(同名取最早创建的一条)
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM users WHERE name = ?1 ORDER BY id ASC LIMIT 1",
            Self::COLUMNS
        );
        let result = conn
            .query_row(&sql, params![name], Self::map_row)
            .optional()?;
        Ok(result)
    }

    pub fn create(&self, new_user: NewUser) -> RepositoryResult<User> {
        let conn = self.get_conn()?;
        let now = Utc::now();
        conn.execute(
            r#"
            INSERT INTO users (name, email, department_id, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                new_user.name,
                new_user.email,
                new_user.department_id,
                new_user.password_hash,
                new_user.role.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(User {
            id,
            name: new_user.name,
            email: new_user.email,
            department_id: new_user.department_id,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        })
    }
}
