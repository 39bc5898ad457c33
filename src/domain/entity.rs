// ==========================================
// AI能力交易平台 - 组织实体领域模型
// ==========================================
// 部门与用户: 导入过程中由实体解析器惰性创建
// 红线: 用户按姓名精确匹配去重(同名合并为已知弱不变量)
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 批量导入创建的占位账号密码哈希(该账号不可登录)
pub const PLACEHOLDER_PASSWORD_HASH: &str = "$2b$10$batch.import.placeholder.hash";

/// 默认部门名称(库内无部门时由解析器创建)
pub const DEFAULT_DEPARTMENT_NAME: &str = "默认部门";

/// 默认部门描述
pub const DEFAULT_DEPARTMENT_DESC: &str = "批量导入时使用的默认部门";

// ==========================================
// Department - 部门
// ==========================================
// name 按约定唯一,不做 DDL 级约束
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// User - 用户
// ==========================================
// 系统创建的账号使用合成邮箱 + 占位密码哈希
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String, // 唯一;缺省时由姓名合成
    pub department_id: Option<i64>,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建用户入参(id 由数据库分配)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub department_id: Option<i64>,
    pub password_hash: String,
    pub role: UserRole,
}

// ==========================================
// UserRole - 用户角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,  // 普通用户
    Admin, // 管理员
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(UserRole::User),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
