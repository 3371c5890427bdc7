//! 文档导入流程 - 流程层
//!
//! 核心职责：定义"一个文档"的完整导入流程
//!
//! 流程顺序：
//! 1. 提取文本（阻塞线程池）
//! 2. 解析题目 + 警告
//! 3. 找到或创建试卷 → 批量写入题目
//! 4. 警告写入 warn.txt

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PaperStore;
use crate::models::document::RawDocument;
use crate::models::question::ImportResult;
use crate::services::{DocumentTextExtractor, QuestionParser, TextExtractor, WarnWriter};
use crate::utils::logging::truncate_text;
use crate::workflow::import_ctx::ImportCtx;

/// 单个文档的导入结果
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub paper_id: i64,
    /// 解析结果（题目 + 警告）
    pub result: ImportResult,
    /// 实际写入的题目数
    pub stored: usize,
}

/// 文档导入流程
///
/// - 编排提取、解析、写入、警告输出
/// - 数据质量问题只产生警告，不会让整个导入失败
/// - 只依赖业务能力（services）和存储（infrastructure）
pub struct ImportFlow {
    parser: QuestionParser,
    extractor: Arc<dyn TextExtractor>,
    papers: PaperStore,
    warn_writer: WarnWriter,
    default_marks: u32,
    verbose_logging: bool,
}

impl ImportFlow {
    /// 创建新的导入流程
    pub fn new(config: &Config, papers: PaperStore) -> Self {
        Self {
            parser: QuestionParser::from_config(config),
            extractor: Arc::new(DocumentTextExtractor),
            papers,
            warn_writer: WarnWriter::with_path(config.warn_file_path.clone()),
            default_marks: config.default_question_marks,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 替换文本提取实现
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn run(&self, document: RawDocument, ctx: &ImportCtx) -> AppResult<ImportOutcome> {
        info!("{} 📄 开始导入: {}", ctx, ctx.file_name);

        // ========== 步骤 1-2: 提取 + 解析 ==========
        let parser = self.parser;
        let extractor = Arc::clone(&self.extractor);
        let result = tokio::task::spawn_blocking(move || {
            parser.parse_document(&document, extractor.as_ref())
        })
        .await??;

        info!(
            "{} ✓ 解析完成: {} 道题目, {} 条警告",
            ctx,
            result.questions.len(),
            result.warnings.len()
        );

        if self.verbose_logging {
            for (i, question) in result.questions.iter().enumerate() {
                info!(
                    "{} 题目 {}: {} (答案: {})",
                    ctx,
                    i + 1,
                    truncate_text(&question.text, 50),
                    question.correct_str()
                );
            }
        }

        // ========== 步骤 3: 写入 ==========
        let paper_id = self.papers.ensure_paper(&ctx.paper_title).await?;
        let stored = if result.questions.is_empty() {
            0
        } else {
            self.papers
                .append_questions(paper_id, &result.questions, self.default_marks)
                .await?
        };

        if stored < result.questions.len() {
            warn!(
                "{} ⚠️ 部分题目写入失败: {}/{}",
                ctx,
                stored,
                result.questions.len()
            );
        }

        // ========== 步骤 4: 警告 ==========
        if !result.warnings.is_empty() {
            warn!(
                "{} ⚠️ {} 条导入警告，写入 {}",
                ctx,
                result.warnings.len(),
                self.warn_writer.path()
            );
            if let Err(e) = self
                .warn_writer
                .write(&ctx.paper_title, &ctx.file_name, &result.warnings)
                .await
            {
                warn!("{} 写入警告文件失败: {:#}", ctx, e);
            }
        }

        info!("{} ✅ 试卷 #{} 写入 {} 道题目", ctx, paper_id, stored);
        Ok(ImportOutcome {
            paper_id,
            result,
            stored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::Database;

    fn flow() -> (ImportFlow, PaperStore) {
        let warn_path = std::env::temp_dir().join(format!("exam_core_flow_{}.txt", uuid::Uuid::new_v4()));
        let config = Config {
            warn_file_path: warn_path.to_string_lossy().to_string(),
            ..Config::default()
        };
        let papers = PaperStore::new(Database::open_in_memory().unwrap());
        (ImportFlow::new(&config, papers.clone()), papers)
    }

    #[tokio::test]
    async fn imports_plain_text_into_named_paper() {
        let (flow, papers) = flow();
        let doc = RawDocument::plain_text("chem.txt", "1. H2O is?\nA) water\nB) salt\nAnswer: A");
        let ctx = ImportCtx::new(doc.stem(), doc.name.clone(), 1);

        let outcome = flow.run(doc, &ctx).await.unwrap();
        assert_eq!(outcome.stored, 1);
        assert!(outcome.result.warnings.is_empty());

        let stored = papers.questions_for_paper(outcome.paper_id).await.unwrap();
        assert_eq!(stored[0].text, "H2O is?");
    }

    #[tokio::test]
    async fn unreadable_container_fails_the_document() {
        let (flow, _) = flow();
        let doc = RawDocument::new(
            "broken.docx",
            crate::models::document::DocumentKind::RichDocument,
            b"not a zip".to_vec(),
        );
        let ctx = ImportCtx::new(doc.stem(), doc.name.clone(), 1);
        let err = flow.run(doc, &ctx).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }
}
