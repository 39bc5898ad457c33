// ==========================================
// AI能力交易平台 - 项目仓储
// ==========================================
// 职责: projects / project_developers / project_impacts /
//       import_batches 表数据访问
// 红线: 不含业务逻辑;标题查重与审核门闩在引擎层
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::project::{
    ImportBatch, NewProject, Project, ProjectDeveloper, ProjectFilter, ProjectImpact,
};
use crate::domain::types::{OperationalStatus, ReviewStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
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

    const COLUMNS: &'static str = "id, title, background, solution, features, estimated_impact, \
        actual_impact, short_description, category, empowered_departments, launch_date, \
        status, review_status, requester_id, requester_department_id, project_lead_id, \
        project_lead_department_id, images, videos, created_at, updated_at";

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Project> {
        let status_str: String = row.get(11)?;
        let status = OperationalStatus::from_db_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                format!("非法运营状态值: {}", status_str).into(),
            )
        })?;
        let review_str: String = row.get(12)?;
        let review_status = ReviewStatus::from_db_str(&review_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                12,
                rusqlite::types::Type::Text,
                format!("非法审核状态值: {}", review_str).into(),
            )
        })?;
        Ok(Project {
            id: row.get(0)?,
            title: row.get(1)?,
            background: row.get(2)?,
            solution: row.get(3)?,
            features: row.get(4)?,
            estimated_impact: row.get(5)?,
            actual_impact: row.get(6)?,
            short_description: row.get(7)?,
            category: row.get(8)?,
            empowered_departments: row.get(9)?,
            launch_date: row
                .get::<_, Option<String>>(10)?
                .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            status,
            review_status,
            requester_id: row.get(13)?,
            requester_department_id: row.get(14)?,
            project_lead_id: row.get(15)?,
            project_lead_department_id: row.get(16)?,
            images: row.get(17)?,
            videos: row.get(18)?,
            created_at: row
                .get::<_, String>(19)?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
            updated_at: row
                .get::<_, String>(20)?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    pub fn create(&self, project: NewProject) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now();
        conn.execute(
            r#"
            INSERT INTO projects (
                title, background, solution, features, estimated_impact, actual_impact,
                short_description, category, empowered_departments, launch_date,
                status, review_status, requester_id, requester_department_id,
                project_lead_id, project_lead_department_id, images, videos,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
            )
            "#,
            params![
                project.title,
                project.background,
                project.solution,
                project.features,
                project.estimated_impact,
                project.actual_impact,
                project.short_description,
                project.category,
                project.empowered_departments,
                project.launch_date.map(|d| d.to_string()),
                project.status.as_str(),
                project.review_status.as_str(),
                project.requester_id,
                project.requester_department_id,
                project.project_lead_id,
                project.project_lead_department_id,
                project.images,
                project.videos,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", Self::COLUMNS);
        let result = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(result)
    }

    /// 按标题精确查找(重复导入幂等性的依据)
    pub fn find_by_title(&self, title: &str) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM projects WHERE title = ?1 ORDER BY id ASC LIMIT 1",
            Self::COLUMNS
        );
        let result = conn
            .query_row(&sql, params![title], Self::map_row)
            .optional()?;
        Ok(result)
    }

    /// 更新审核状态(其余字段不动)
    pub fn update_review_status(&self, id: i64, status: ReviewStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE projects SET review_status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Project".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 更新媒体 URL 列表(仅覆盖传入的字段)
    pub fn update_media(
        &self,
        id: i64,
        images: Option<&str>,
        videos: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE projects
            SET images = COALESCE(?1, images),
                videos = COALESCE(?2, videos),
                updated_at = ?3
            WHERE id = ?4
            "#,
            params![images, videos, Utc::now().to_rfc3339(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Project".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 按条件列出项目(创建时间倒序)
    pub fn list(&self, filter: &ProjectFilter) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;

        let mut conditions = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(category) = &filter.category {
            conditions.push(format!("category = ?{}", values.len() + 1));
            values.push(category.clone());
        }
        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", values.len() + 1));
            values.push(status.as_str().to_string());
        }
        if let Some(review_status) = filter.review_status {
            conditions.push(format!("review_status = ?{}", values.len() + 1));
            values.push(review_status.as_str().to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM projects {} ORDER BY created_at DESC, id DESC",
            Self::COLUMNS,
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<rusqlite::Result<Vec<Project>>>()?;
        Ok(projects)
    }

    // ==========================================
    // 开发人员关联
    // ==========================================

    /// 插入开发人员关联(重复关联静默忽略)
    pub fn insert_developer(
        &self,
        project_id: i64,
        user_id: i64,
        role: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR IGNORE INTO project_developers (project_id, user_id, role)
            VALUES (?1, ?2, ?3)
            "#,
            params![project_id, user_id, role],
        )?;
        Ok(())
    }

    pub fn list_developers(&self, project_id: i64) -> RepositoryResult<Vec<ProjectDeveloper>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, user_id, role
            FROM project_developers
            WHERE project_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let developers = stmt
            .query_map(params![project_id], |row| {
                Ok(ProjectDeveloper {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    user_id: row.get(2)?,
                    role: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<ProjectDeveloper>>>()?;
        Ok(developers)
    }

    // ==========================================
    // 关键效果指标
    // ==========================================

    pub fn insert_impact(&self, impact: &ProjectImpact) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO project_impacts (project_id, efficiency, cost_saving, satisfaction)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                impact.project_id,
                impact.efficiency,
                impact.cost_saving,
                impact.satisfaction,
            ],
        )?;
        Ok(())
    }

    pub fn find_impact(&self, project_id: i64) -> RepositoryResult<Option<ProjectImpact>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                r#"
                SELECT project_id, efficiency, cost_saving, satisfaction
                FROM project_impacts
                WHERE project_id = ?1
                "#,
                params![project_id],
                |row| {
                    Ok(ProjectImpact {
                        project_id: row.get(0)?,
                        efficiency: row.get(1)?,
                        cost_saving: row.get(2)?,
                        satisfaction: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // ==========================================
    // 导入批次审计
    // ==========================================

    pub fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batches (
                batch_id, file_name, total_rows, success_rows, fail_rows,
                skipped_rows, imported_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.total_rows,
                batch.success_rows,
                batch.fail_rows,
                batch.skipped_rows,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
            ],
        )?;
        Ok(())
    }
}
