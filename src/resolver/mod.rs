// ==========================================
// AI能力交易平台 - 实体解析器
// ==========================================
// 职责: 摄入过程中的部门/用户 get-or-create,防止重复人员记录
// 红线: 同批次内顺序执行,后行必须能看到前行创建的实体
// 已知弱不变量: 用户按姓名精确匹配,同名真人会坍缩为同一账号
// ==========================================

use crate::domain::entity::{
    Department, NewUser, User, UserRole, DEFAULT_DEPARTMENT_DESC, DEFAULT_DEPARTMENT_NAME,
    PLACEHOLDER_PASSWORD_HASH,
};
use crate::repository::{DepartmentRepository, RepositoryResult, UserRepository};
use tracing::{debug, info, warn};

/// 合成邮箱的固定域名(系统创建的占位账号)
pub const DEFAULT_EMAIL_DOMAIN: &str = "51talk.com";

/// 默认需求方账号(库内无用户时创建)
const DEFAULT_ADMIN_NAME: &str = "系统管理员";
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";

pub struct EntityResolver {
    department_repo: DepartmentRepository,
    user_repo: UserRepository,
    email_domain: String,
}

impl EntityResolver {
    pub fn new(department_repo: DepartmentRepository, user_repo: UserRepository) -> Self {
        Self {
            department_repo,
            user_repo,
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }

    /// 覆盖合成邮箱域名(配置口径)
    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Self {
        self.email_domain = domain.into();
        self
    }

    /// 解析默认部门
    ///
    /// 取库内第一个部门(id 升序);一个都没有时创建"默认部门"。
    /// 注意: 非按名称匹配,语义是租户级单例回退
    pub fn resolve_default_department(&self) -> RepositoryResult<Department> {
        if let Some(department) = self.department_repo.find_first()? {
            return Ok(department);
        }
        let department = self
            .department_repo
            .create(DEFAULT_DEPARTMENT_NAME, Some(DEFAULT_DEPARTMENT_DESC))?;
        info!(department = %department.name, id = department.id, "创建默认部门");
        Ok(department)
    }

    /// 按名称解析部门: 精确匹配,未命中回退默认部门
    pub fn resolve_department_by_name(&self, name: &str) -> RepositoryResult<Department> {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            if let Some(department) = self.department_repo.find_by_name(trimmed)? {
                return Ok(department);
            }
            warn!(name = %trimmed, "未找到部门,使用默认部门");
        }
        self.resolve_default_department()
    }

    /// 解析默认需求方用户(批量导入的 requester 回退)
    pub fn resolve_default_user(&self, fallback: &Department) -> RepositoryResult<User> {
        if let Some(user) = self.user_repo.find_first()? {
            return Ok(user);
        }
        let user = self.user_repo.create(NewUser {
            name: DEFAULT_ADMIN_NAME.to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            department_id: Some(fallback.id),
            password_hash: PLACEHOLDER_PASSWORD_HASH.to_string(),
            role: UserRole::Admin,
        })?;
        info!(user = %user.name, id = user.id, "创建默认用户");
        Ok(user)
    }

    /// 按姓名解析用户(get-or-create)
    ///
    /// - 空白姓名 → Ok(None)
    /// - 精确同名命中 → 返回既有用户(进程内幂等)
    /// - 未命中 → 创建占位账号: 合成邮箱 + 占位密码哈希 + 回退部门
    pub fn resolve_user(
        &self,
        name: &str,
        fallback: &Department,
    ) -> RepositoryResult<Option<User>> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Some(user) = self.user_repo.find_by_name(trimmed)? {
            debug!(name = %trimmed, id = user.id, "命中既有用户");
            return Ok(Some(user));
        }

        let email = self.synthesize_email(trimmed);
        let user = self.user_repo.create(NewUser {
            name: trimmed.to_string(),
            email,
            department_id: Some(fallback.id),
            password_hash: PLACEHOLDER_PASSWORD_HASH.to_string(),
            role: UserRole::User,
        })?;
        info!(name = %user.name, id = user.id, "创建用户");
        Ok(Some(user))
    }

    /// 合成邮箱: 小写、去空白的姓名 @ 固定域名
    fn synthesize_email(&self, name: &str) -> String {
        let local: String = name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        format!("{}@{}", local, self.email_domain)
    }
}
