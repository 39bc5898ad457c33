// ==========================================
// AI能力交易平台 - 文档分析集成层
// ==========================================
// 职责: 外部文档分析服务的调用契约与响应提取
// ==========================================

pub mod client;
pub mod extract;

pub use client::{
    AnalysisError, DocumentAnalysisService, HttpAnalysisClient, DEFAULT_ANALYSIS_TIMEOUT_MS,
};
pub use extract::{
    extract_json_object, parse_analysis_response, DocumentParseOutcome, ParsedProjectDocument,
    DEFAULT_PARSE_PROMPT,
};
