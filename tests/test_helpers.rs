// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 测试数据库初始化、组件装配、分析服务打桩
// ==========================================

use ai_capability_hub::analysis::{AnalysisError, DocumentAnalysisService};
use ai_capability_hub::db;
use ai_capability_hub::engine::ProjectBuilder;
use ai_capability_hub::repository::{
    DepartmentRepository, ProjectRepository, UserRepository,
};
use ai_capability_hub::resolver::EntityResolver;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 创建内存测试数据库并初始化 schema
pub fn create_test_conn() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().expect("无法创建内存数据库");
    db::configure_sqlite_connection(&conn).expect("无法配置连接");
    db::init_schema(&conn).expect("无法初始化 schema");
    Arc::new(Mutex::new(conn))
}

/// 从共享连接装配实体解析器
pub fn build_resolver(conn: &Arc<Mutex<Connection>>) -> EntityResolver {
    EntityResolver::new(
        DepartmentRepository::from_connection(conn.clone()),
        UserRepository::from_connection(conn.clone()),
    )
}

/// 从共享连接装配规范项目构建器
pub fn build_project_builder(conn: &Arc<Mutex<Connection>>) -> ProjectBuilder {
    ProjectBuilder::new(
        build_resolver(conn),
        ProjectRepository::from_connection(conn.clone()),
    )
}

// ==========================================
// StubAnalysisService - 分析服务打桩
// ==========================================
// response = Some(text) 固定返回该文本;None 模拟服务超时
pub struct StubAnalysisService {
    pub response: Option<String>,
}

impl StubAnalysisService {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Some(text.to_string()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self { response: None })
    }
}

#[async_trait]
impl DocumentAnalysisService for StubAnalysisService {
    async fn analyze(
        &self,
        _document_text: &str,
        _instruction: Option<&str>,
    ) -> Result<String, AnalysisError> {
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(AnalysisError::Timeout),
        }
    }
}
