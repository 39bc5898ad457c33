// ==========================================
// AI能力交易平台 - 项目批量导入器
// ==========================================
// 流程: 解析文件 → 字段归一化 → 规范构建(含实体解析) → 汇总
// 红线: 逐行顺序处理(解析器/查重依赖前行效果,禁止并行);
//       行级失败只计数,绝不中断后续行;
//       批次级致命错误仅限文件不存在/格式不支持/空表
// ==========================================

use crate::domain::project::{ImportBatch, ImportSummary};
use crate::domain::types::IngestSource;
use crate::engine::project_builder::{BuildOutcome, ProjectBuilder};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_normalizer::normalize_row;
use crate::importer::file_parser::FileParser;
use crate::repository::ProjectRepository;
use chrono::Utc;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct BulkProjectImporter {
    file_parser: Box<dyn FileParser>,
    builder: ProjectBuilder,
    project_repo: ProjectRepository,
}

impl BulkProjectImporter {
    pub fn new(
        file_parser: Box<dyn FileParser>,
        builder: ProjectBuilder,
        project_repo: ProjectRepository,
    ) -> Self {
        Self {
            file_parser,
            builder,
            project_repo,
        }
    }

    /// 从表格文件批量导入项目
    ///
    /// # 返回
    /// - Ok(ImportSummary): 成功/失败/跳过计数与行级错误明细
    /// - Err: 批次级致命错误(文件/空表)
    #[instrument(skip(self, file_path), fields(batch_id))]
    pub fn import_from_file(&self, file_path: &Path) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        info!(file = %file_path.display(), "开始导入项目数据");

        // === 步骤 1: 解析文件 ===
        let rows = self.file_parser.parse_to_rows(file_path)?;
        if rows.is_empty() {
            return Err(ImportError::EmptySheet(file_path.display().to_string()));
        }
        let total_rows = rows.len();
        info!(total_rows, "文件解析完成");

        // === 步骤 2: 逐行归一化 + 构建(顺序执行) ===
        let mut success = 0usize;
        let mut failed = 0usize;
        let mut skipped = 0usize;
        let mut errors: Vec<(usize, String)> = Vec::new();
        let mut unmapped: BTreeSet<String> = BTreeSet::new();

        for (idx, row) in rows.iter().enumerate() {
            // 表格行号(1 起始 + 表头行)
            let row_number = idx + 2;

            let normalized = normalize_row(row);
            unmapped.extend(normalized.unmapped.iter().cloned());

            match self.builder.build_from_row(&normalized, IngestSource::BulkImport) {
                Ok(BuildOutcome::Created { project_id, title }) => {
                    success += 1;
                    info!(row = row_number, project_id, title = %title, "行导入成功");
                }
                Ok(BuildOutcome::Skipped { title }) => {
                    // 幂等跳过,与失败分开记录
                    skipped += 1;
                    info!(row = row_number, title = %title, "行跳过(同名项目已存在)");
                }
                Err(e) => {
                    failed += 1;
                    warn!(row = row_number, error = %e, "行导入失败");
                    errors.push((row_number, e.to_string()));
                }
            }
        }

        // 未映射列名仅作诊断信息上报
        if !unmapped.is_empty() {
            warn!(labels = ?unmapped, "存在未映射的源列名");
        }

        let elapsed = start_time.elapsed();

        // === 步骤 3: 记录批次审计 ===
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            file_name,
            total_rows: total_rows as i32,
            success_rows: success as i32,
            fail_rows: failed as i32,
            skipped_rows: skipped as i32,
            imported_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as i64,
        };
        self.project_repo.insert_batch(&batch)?;

        info!(
            batch_id = %batch_id,
            total = total_rows,
            success,
            failed,
            skipped,
            elapsed_ms = elapsed.as_millis(),
            "项目数据导入完成"
        );

        Ok(ImportSummary {
            batch_id,
            total_rows,
            success,
            failed,
            skipped,
            errors,
            unmapped_labels: unmapped.into_iter().collect(),
        })
    }
}
