// ==========================================
// AI能力交易平台 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 口径: 状态机违规与校验错误必须可区分(错误分类契约)
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum WorkflowError {
    // ===== 状态机违规 =====
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ===== 业务规则错误 =====
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据校验失败: {0}")]
    ValidationError(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ===== 底层错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type WorkflowResult<T> = Result<T, WorkflowError>;
