// ==========================================
// AI能力交易平台 - 文档分析服务客户端
// ==========================================
// 职责: 调用外部文档分析服务(自由文本 + 可选指令 → 结构化文本)
// 红线: 调用必须有界(超时);服务不可用降级为"分析不可用",
//       绝不升级为工作流错误
// ==========================================

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 默认请求超时(毫秒)
pub const DEFAULT_ANALYSIS_TIMEOUT_MS: u64 = 30_000;

/// 分析服务错误类型
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("分析服务未配置(缺少服务地址)")]
    NotConfigured,

    #[error("网络错误: {0}")]
    NetworkError(String),

    #[error("请求超时")]
    Timeout,

    #[error("服务返回错误 {0}: {1}")]
    ApiError(u16, String),

    #[error("服务返回空响应")]
    EmptyResponse,
}

/// 文档分析服务接口
///
/// 入参: 自由文本 + 可选自定义指令;出参: 自由格式的结构化文本
/// (可能包裹在代码块或散文中,由 extract 模块负责提取)
#[async_trait]
pub trait DocumentAnalysisService: Send + Sync {
    async fn analyze(
        &self,
        document_text: &str,
        instruction: Option<&str>,
    ) -> Result<String, AnalysisError>;
}

// ==========================================
// HttpAnalysisClient - HTTP 实现
// ==========================================
pub struct HttpAnalysisClient {
    http_client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpAnalysisClient {
    /// 创建客户端;endpoint 为空时客户端可构造,调用时报 NotConfigured
    pub fn new(endpoint: Option<String>, timeout_ms: u64) -> Result<Self, AnalysisError> {
        if endpoint.is_none() {
            tracing::warn!("分析服务地址未配置,文档解析与申请分析功能将不可用");
        }
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AnalysisError::NetworkError(e.to_string()))?;
        Ok(Self {
            http_client,
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
        })
    }
}

#[async_trait]
impl DocumentAnalysisService for HttpAnalysisClient {
    async fn analyze(
        &self,
        document_text: &str,
        instruction: Option<&str>,
    ) -> Result<String, AnalysisError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(AnalysisError::NotConfigured)?;

        let body = serde_json::json!({
            "document_text": document_text,
            "prompt": instruction,
        });

        let response = self
            .http_client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout
                } else {
                    AnalysisError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalysisError::ApiError(status.as_u16(), message));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::NetworkError(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(text)
    }
}
