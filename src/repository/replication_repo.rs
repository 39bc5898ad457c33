// ==========================================
// AI能力交易平台 - 部署申请仓储
// ==========================================
// 职责: replication_requests 表数据访问
// 红线: 不含业务逻辑;状态推进合法性由引擎层裁决
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::replication::{
    ReplicationApplication, ReplicationFilter, ReplicationRequest, Urgency,
};
use crate::domain::types::ReplicationStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct ReplicationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReplicationRepository {
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

    const COLUMNS: &'static str = "id, project_id, replicator_id, department_id, \
        applicant_name, department, contact_phone, email, team_size, urgency, \
        target_launch_date, business_scenario, expected_goals, budget_range, \
        additional_needs, status, ai_analysis, ai_analysis_at, applied_at, deployed_at";

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ReplicationRequest> {
        let urgency_str: String = row.get(9)?;
        let urgency = Urgency::from_db_str(&urgency_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                9,
                rusqlite::types::Type::Text,
                format!("非法紧急程度值: {}", urgency_str).into(),
            )
        })?;
        let status_str: String = row.get(15)?;
        let status = ReplicationStatus::from_db_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                15,
                rusqlite::types::Type::Text,
                format!("非法申请状态值: {}", status_str).into(),
            )
        })?;
        Ok(ReplicationRequest {
            id: row.get(0)?,
            project_id: row.get(1)?,
            replicator_id: row.get(2)?,
            department_id: row.get(3)?,
            applicant_name: row.get(4)?,
            department: row.get(5)?,
            contact_phone: row.get(6)?,
            email: row.get(7)?,
            team_size: row.get(8)?,
            urgency,
            target_launch_date: row.get(10)?,
            business_scenario: row.get(11)?,
            expected_goals: row.get(12)?,
            budget_range: row.get(13)?,
            additional_needs: row.get(14)?,
            status,
            ai_analysis: row.get(16)?,
            ai_analysis_at: row
                .get::<_, Option<String>>(17)?
                .and_then(|s| s.parse().ok()),
            applied_at: row
                .get::<_, String>(18)?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
            deployed_at: row
                .get::<_, Option<String>>(19)?
                .and_then(|s| s.parse().ok()),
        })
    }

    /// 创建部署申请(初始状态 APPLIED)
    pub fn create(
        &self,
        project_id: i64,
        replicator_id: i64,
        department_id: i64,
        application: &ReplicationApplication,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO replication_requests (
                project_id, replicator_id, department_id, applicant_name, department,
                contact_phone, email, team_size, urgency, target_launch_date,
                business_scenario, expected_goals, budget_range, additional_needs,
                status, applied_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16
            )
            "#,
            params![
                project_id,
                replicator_id,
                department_id,
                application.applicant_name,
                application.department,
                application.contact_phone,
                application.email,
                application.team_size,
                application.urgency.as_str(),
                application.target_launch_date,
                application.business_scenario,
                application.expected_goals,
                application.budget_range,
                application.additional_needs,
                ReplicationStatus::Applied.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ReplicationRequest>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM replication_requests WHERE id = ?1",
            Self::COLUMNS
        );
        let result = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(result)
    }

    /// 按条件列出申请(申请时间倒序)
    pub fn list(&self, filter: &ReplicationFilter) -> RepositoryResult<Vec<ReplicationRequest>> {
        let conn = self.get_conn()?;

        let mut conditions = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", values.len() + 1));
            values.push(status.as_str().to_string());
        }
        if let Some(project_id) = filter.project_id {
            conditions.push(format!("project_id = ?{}", values.len() + 1));
            values.push(project_id.to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM replication_requests {} ORDER BY applied_at DESC, id DESC",
            Self::COLUMNS,
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let requests = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<rusqlite::Result<Vec<ReplicationRequest>>>()?;
        Ok(requests)
    }

    /// 更新申请状态;DEPLOYED 时写入部署时间
    pub fn update_status(
        &self,
        id: i64,
        status: ReplicationStatus,
        deployed_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE replication_requests SET status = ?1, deployed_at = COALESCE(?2, deployed_at) WHERE id = ?3",
            params![
                status.as_str(),
                deployed_at.map(|dt| dt.to_rfc3339()),
                id
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ReplicationRequest".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 写入 AI 分析附件(幂等覆盖)
    pub fn set_analysis(
        &self,
        id: i64,
        analysis: &str,
        analyzed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE replication_requests SET ai_analysis = ?1, ai_analysis_at = ?2 WHERE id = ?3",
            params![analysis, analyzed_at.to_rfc3339(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ReplicationRequest".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
