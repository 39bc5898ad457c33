// ==========================================
// AI能力交易平台 - 批量导入接口
// ==========================================
// 职责: 批量导入入口(默认路径解析 + 汇总上报)
// 口径: 行级问题进入汇总,只有文件级错误才会失败
// ==========================================

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::project::ImportSummary;
use crate::importer::BulkProjectImporter;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ImportApi {
    importer: BulkProjectImporter,
    config: ConfigManager,
    /// 默认导入目录(未显式给出文件路径时使用)
    data_dir: PathBuf,
}

impl ImportApi {
    pub fn new(importer: BulkProjectImporter, config: ConfigManager, data_dir: PathBuf) -> Self {
        Self {
            importer,
            config,
            data_dir,
        }
    }

    /// 执行批量导入
    ///
    /// # 参数
    /// - file_path: 表格文件路径;None 时使用数据目录下的默认文件名
    pub fn import_projects(&self, file_path: Option<&Path>) -> ApiResult<ImportSummary> {
        let path = match file_path {
            Some(p) => p.to_path_buf(),
            None => self.data_dir.join(self.config.default_import_file()?),
        };
        info!(path = %path.display(), "批量导入入口");

        let summary = self.importer.import_from_file(&path)?;
        Ok(summary)
    }
}
