//! 客观题解析服务 - 业务能力层
//!
//! 文本 → 行 → 分类 → 组装，输出题目列表和警告。
//! 解析本身不会因为数据质量问题失败，只有文档容器不可读时才返回错误。

use crate::config::Config;
use crate::error::ExtractionError;
use crate::models::document::RawDocument;
use crate::models::question::ImportResult;
use crate::services::import_diagnostics::{ImportDiagnostics, ImportWarning};
use crate::services::line_classifier::classify_all;
use crate::services::question_assembler::{OptionlessPolicy, QuestionAssembler};
use crate::services::text_extractor::TextExtractor;
use crate::services::text_normalizer::normalize;

/// 客观题解析器
///
/// 无内部状态，同一输入多次解析结果相同
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionParser {
    assembler: QuestionAssembler,
}

impl QuestionParser {
    pub fn new(policy: OptionlessPolicy) -> Self {
        Self {
            assembler: QuestionAssembler::new(policy),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let policy = if config.emit_optionless_questions {
            OptionlessPolicy::EmitWithWarning
        } else {
            OptionlessPolicy::Drop
        };
        Self::new(policy)
    }

    /// 解析纯文本
    pub fn parse_text(&self, text: &str) -> ImportResult {
        let lines = normalize(text);
        let mut diagnostics = ImportDiagnostics::new();

        if lines.is_empty() {
            diagnostics.push(ImportWarning::EmptyDocument);
            return ImportResult {
                questions: Vec::new(),
                warnings: diagnostics.into_messages(),
            };
        }

        let classified = classify_all(&lines);
        let questions = self.assembler.run(&classified, &mut diagnostics);

        // 已有题块级警告时不再重复提示
        if questions.is_empty() && diagnostics.is_empty() {
            diagnostics.push(ImportWarning::NoQuestionsDetected);
        }

        tracing::debug!(
            "解析完成: {} 行 → {} 道题目, {} 条警告",
            lines.len(),
            questions.len(),
            diagnostics.len()
        );

        ImportResult {
            questions,
            warnings: diagnostics.into_messages(),
        }
    }

    /// 先提取文本再解析
    pub fn parse_document(
        &self,
        document: &RawDocument,
        extractor: &dyn TextExtractor,
    ) -> Result<ImportResult, ExtractionError> {
        let text = extractor.extract_text(document)?;
        Ok(self.parse_text(&text))
    }
}
