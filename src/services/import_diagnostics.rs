//! 导入诊断 - 业务能力层
//!
//! 收集导入过程中的非致命问题，按出现顺序输出

use std::fmt;

use crate::models::question::OptionLetter;
use crate::utils::logging::truncate_text;

/// 警告中题干预览的最大字符数
const STEM_PREVIEW_CHARS: usize = 50;

/// 导入警告
///
/// `question` 为题块序号（从 1 开始，包括被丢弃的题块），`line` 为源文档行号
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportWarning {
    /// 文档没有任何非空行
    EmptyDocument,
    /// 有内容但没有解析出任何题目，且没有其他警告
    NoQuestionsDetected,
    /// 选项字母超出 A–E，该行被忽略
    InvalidOptionLetter { line: usize, letter: char },
    /// 答案字母超出 A–E
    InvalidAnswerLetter { question: usize, letter: char },
    /// 答案指向没有文本的选项
    AnswerWithoutOption { question: usize, letter: OptionLetter },
    /// 没有答案行
    MissingAnswer { question: usize },
    /// 有选项但没有题干
    MissingStem { question: usize },
    /// 题块没有任何选项
    NoOptions {
        question: usize,
        stem: String,
        dropped: bool,
    },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::EmptyDocument => {
                write!(f, "No content: the document contains no text.")
            }
            ImportWarning::NoQuestionsDetected => write!(
                f,
                "No questions were detected. Check that the file has clear questions, options (A-E) and ANSWER: lines."
            ),
            ImportWarning::InvalidOptionLetter { line, letter } => {
                write!(f, "Line {}: option \"{}\" is not A-E and was ignored.", line, letter)
            }
            ImportWarning::InvalidAnswerLetter { question, letter } => write!(
                f,
                "Q{}: answer \"{}\" is not A-E; no valid answer found, correct option left blank.",
                question, letter
            ),
            ImportWarning::AnswerWithoutOption { question, letter } => write!(
                f,
                "Q{}: answer \"{}\" references an option with no text.",
                question, letter
            ),
            ImportWarning::MissingAnswer { question } => write!(
                f,
                "Q{}: no ANSWER line found; no valid answer found, correct option left blank.",
                question
            ),
            ImportWarning::MissingStem { question } => {
                write!(f, "Q{}: options found without any question text.", question)
            }
            ImportWarning::NoOptions {
                question,
                stem,
                dropped,
            } => write!(
                f,
                "Q{}: no options detected for this question \"{}\"; {}.",
                question,
                truncate_text(stem, STEM_PREVIEW_CHARS),
                if *dropped { "skipped" } else { "kept without options" }
            ),
        }
    }
}

/// 警告收集器
#[derive(Debug, Clone, Default)]
pub struct ImportDiagnostics {
    warnings: Vec<ImportWarning>,
}

impl ImportDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: ImportWarning) {
        tracing::debug!("导入警告: {}", warning);
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = ImportWarning>) {
        for warning in warnings {
            self.push(warning);
        }
    }

    pub fn warnings(&self) -> &[ImportWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// 转为面向用户的字符串列表
    pub fn into_messages(self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}
