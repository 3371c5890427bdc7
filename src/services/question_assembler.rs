//! 题目组装 - 业务能力层
//!
//! 把分类后的行组装成题目。状态机只有三个状态：
//!
//! ```text
//! Idle ──题号/像题干的文本──▶ CollectingStem ──选项/答案──▶ CollectingOptionsAndAnswer
//!   ▲                              │ 新题号/像题干: 输出当前题           │ 其他行: 输出当前题,
//!   └──────────────────────────────┴─────────────────────────────────────┘ 回到 Idle 重新处理
//! ```
//!
//! 以题号开头的题干只被下一个题号打断；无编号的题干遇到下一行"像题干"的文本即结束。
//!
//! `transition` 和 `finalize` 都是纯函数，`QuestionAssembler::run` 只负责驱动。

use std::collections::BTreeMap;

use crate::models::question::{OptionLetter, ParsedQuestion};
use crate::services::import_diagnostics::{ImportDiagnostics, ImportWarning};
use crate::services::line_classifier::{looks_like_question, ClassifiedLine, LineKind};

/// 没有任何选项的题块如何处理
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionlessPolicy {
    /// 丢弃并记录警告
    #[default]
    Drop,
    /// 仍然输出（选项全空）并记录警告
    EmitWithWarning,
}

/// 正在组装中的题块
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub stem: String,
    /// 已出现的 A–E 选项，同一字母后出现的覆盖先出现的
    pub options: BTreeMap<OptionLetter, String>,
    /// 最后一个答案行的字母（未校验）
    pub answer: Option<char>,
    /// 题干由显式题号开始
    pub numbered: bool,
}

impl QuestionDraft {
    pub fn with_stem(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            ..Self::default()
        }
    }

    pub fn numbered(stem: impl Into<String>) -> Self {
        Self {
            numbered: true,
            ..Self::with_stem(stem)
        }
    }

    fn append_stem(&mut self, text: &str) {
        if self.stem.is_empty() {
            self.stem = text.to_string();
        } else {
            self.stem.push(' ');
            self.stem.push_str(text);
        }
    }

    fn has_any_option(&self) -> bool {
        self.options.values().any(|v| !v.trim().is_empty())
    }

    /// 什么都没收集到，不算一个题块
    pub fn is_blank(&self) -> bool {
        self.stem.trim().is_empty() && !self.has_any_option() && self.answer.is_none()
    }
}

/// 组装器状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssemblerState {
    #[default]
    Idle,
    CollectingStem(QuestionDraft),
    CollectingOptionsAndAnswer(QuestionDraft),
}

/// 一次状态转移的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: AssemblerState,
    /// 因这一行而结束的题块，需要先于 `warnings` 交给 `finalize`
    pub flushed: Option<QuestionDraft>,
    /// 这一行本身产生的警告
    pub warnings: Vec<ImportWarning>,
}

impl Transition {
    fn stay(next: AssemblerState) -> Self {
        Self {
            next,
            flushed: None,
            warnings: Vec::new(),
        }
    }

    fn warn(next: AssemblerState, warning: ImportWarning) -> Self {
        Self {
            next,
            flushed: None,
            warnings: vec![warning],
        }
    }
}

/// 单步状态转移
///
/// `starts_question` 是无编号时的前瞻判断结果（见 `looks_like_question`），
/// 对 `Idle` 下的普通文本行和无编号题干中的普通文本行生效。
pub fn transition(state: AssemblerState, line: &ClassifiedLine, starts_question: bool) -> Transition {
    // 超出 A–E 的选项行在任何状态下都只记录警告
    if let LineKind::Option { letter, .. } = &line.kind {
        if OptionLetter::from_char(*letter).is_none() {
            return Transition::warn(
                state,
                ImportWarning::InvalidOptionLetter {
                    line: line.number,
                    letter: *letter,
                },
            );
        }
    }

    match state {
        AssemblerState::Idle => match &line.kind {
            LineKind::QuestionStart { text, .. } => {
                Transition::stay(AssemblerState::CollectingStem(QuestionDraft::numbered(text)))
            }
            LineKind::Plain { text } if starts_question => {
                Transition::stay(AssemblerState::CollectingStem(QuestionDraft::with_stem(text)))
            }
            LineKind::Plain { text } => {
                tracing::debug!("第 {} 行不属于任何题目，已忽略: {}", line.number, text);
                Transition::stay(AssemblerState::Idle)
            }
            LineKind::Option { .. } | LineKind::Answer { .. } => {
                let mut draft = QuestionDraft::default();
                apply_option_or_answer(&mut draft, &line.kind);
                Transition::stay(AssemblerState::CollectingOptionsAndAnswer(draft))
            }
        },

        AssemblerState::CollectingStem(mut draft) => match &line.kind {
            LineKind::Plain { text } if starts_question && !draft.numbered => Transition {
                next: AssemblerState::CollectingStem(QuestionDraft::with_stem(text)),
                flushed: Some(draft),
                warnings: Vec::new(),
            },
            LineKind::Plain { text } => {
                draft.append_stem(text);
                Transition::stay(AssemblerState::CollectingStem(draft))
            }
            LineKind::QuestionStart { text, .. } => Transition {
                next: AssemblerState::CollectingStem(QuestionDraft::numbered(text)),
                flushed: Some(draft),
                warnings: Vec::new(),
            },
            LineKind::Option { .. } | LineKind::Answer { .. } => {
                apply_option_or_answer(&mut draft, &line.kind);
                Transition::stay(AssemblerState::CollectingOptionsAndAnswer(draft))
            }
        },

        AssemblerState::CollectingOptionsAndAnswer(mut draft) => match &line.kind {
            LineKind::Option { .. } | LineKind::Answer { .. } => {
                apply_option_or_answer(&mut draft, &line.kind);
                Transition::stay(AssemblerState::CollectingOptionsAndAnswer(draft))
            }
            LineKind::QuestionStart { .. } | LineKind::Plain { .. } => {
                let reprocessed = transition(AssemblerState::Idle, line, starts_question);
                Transition {
                    flushed: Some(draft),
                    ..reprocessed
                }
            }
        },
    }
}

fn apply_option_or_answer(draft: &mut QuestionDraft, kind: &LineKind) {
    match kind {
        LineKind::Option { letter, text } => {
            if let Some(letter) = OptionLetter::from_char(*letter) {
                draft.options.insert(letter, text.clone());
            }
        }
        LineKind::Answer { letter } => draft.answer = Some(*letter),
        _ => {}
    }
}

/// 输入结束时取出未完成的题块
pub fn finish(state: AssemblerState) -> Option<QuestionDraft> {
    match state {
        AssemblerState::Idle => None,
        AssemblerState::CollectingStem(draft) | AssemblerState::CollectingOptionsAndAnswer(draft) => {
            Some(draft)
        }
    }
}

/// 把题块转成题目，返回 (题目, 警告)
///
/// - 空题块：静默丢弃
/// - 没有任何选项：按 `policy` 丢弃或保留，都带警告
/// - 答案指向空选项：保留答案并警告
/// - 答案缺失或超出 A–E：答案留空并警告
pub fn finalize(
    draft: QuestionDraft,
    question_number: usize,
    policy: OptionlessPolicy,
) -> (Option<ParsedQuestion>, Vec<ImportWarning>) {
    if draft.is_blank() {
        return (None, Vec::new());
    }

    let mut warnings = Vec::new();
    let stem = draft.stem.trim().to_string();

    if !draft.has_any_option() && policy == OptionlessPolicy::Drop {
        warnings.push(ImportWarning::NoOptions {
            question: question_number,
            stem,
            dropped: true,
        });
        return (None, warnings);
    }

    if stem.is_empty() {
        warnings.push(ImportWarning::MissingStem {
            question: question_number,
        });
    }

    let mut question = ParsedQuestion::new(stem.clone());
    for (letter, text) in &draft.options {
        question.set_option(*letter, text.clone());
    }

    match draft.answer {
        Some(raw) => match OptionLetter::from_char(raw) {
            Some(letter) => {
                if question.option(letter).trim().is_empty() {
                    warnings.push(ImportWarning::AnswerWithoutOption {
                        question: question_number,
                        letter,
                    });
                }
                question.correct = Some(letter);
            }
            None => warnings.push(ImportWarning::InvalidAnswerLetter {
                question: question_number,
                letter: raw,
            }),
        },
        None => warnings.push(ImportWarning::MissingAnswer {
            question: question_number,
        }),
    }

    if !question.has_any_option() {
        warnings.push(ImportWarning::NoOptions {
            question: question_number,
            stem,
            dropped: false,
        });
    }

    (Some(question), warnings)
}

/// 题目组装器
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionAssembler {
    policy: OptionlessPolicy,
}

impl QuestionAssembler {
    pub fn new(policy: OptionlessPolicy) -> Self {
        Self { policy }
    }

    /// 按源文档顺序组装所有题目，警告写入 `diagnostics`
    pub fn run(&self, lines: &[ClassifiedLine], diagnostics: &mut ImportDiagnostics) -> Vec<ParsedQuestion> {
        let mut questions = Vec::new();
        let mut blocks = 0usize;
        let mut state = AssemblerState::Idle;

        for (idx, line) in lines.iter().enumerate() {
            let starts_question = looks_like_question(lines, idx);
            let step = transition(state, line, starts_question);

            if let Some(draft) = step.flushed {
                self.flush(draft, &mut blocks, &mut questions, diagnostics);
            }
            diagnostics.extend(step.warnings);
            state = step.next;
        }

        if let Some(draft) = finish(state) {
            self.flush(draft, &mut blocks, &mut questions, diagnostics);
        }

        questions
    }

    fn flush(
        &self,
        draft: QuestionDraft,
        blocks: &mut usize,
        questions: &mut Vec<ParsedQuestion>,
        diagnostics: &mut ImportDiagnostics,
    ) {
        if draft.is_blank() {
            return;
        }
        *blocks += 1;

        let (question, warnings) = finalize(draft, *blocks, self.policy);
        diagnostics.extend(warnings);
        if let Some(question) = question {
            questions.push(question);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(number: usize, kind: LineKind) -> ClassifiedLine {
        ClassifiedLine { number, kind }
    }

    fn plain(text: &str) -> LineKind {
        LineKind::Plain {
            text: text.to_string(),
        }
    }

    fn option(letter: char, text: &str) -> LineKind {
        LineKind::Option {
            letter,
            text: text.to_string(),
        }
    }

    fn start(text: &str) -> LineKind {
        LineKind::QuestionStart {
            number: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn idle_plain_without_lookahead_is_ignored() {
        let t = transition(AssemblerState::Idle, &line(1, plain("Mathematics Paper")), false);
        assert_eq!(t.next, AssemblerState::Idle);
        assert!(t.flushed.is_none());
        assert!(t.warnings.is_empty());
    }

    #[test]
    fn idle_plain_with_lookahead_starts_stem() {
        let t = transition(AssemblerState::Idle, &line(1, plain("Which is a mammal?")), true);
        assert_eq!(
            t.next,
            AssemblerState::CollectingStem(QuestionDraft::with_stem("Which is a mammal?"))
        );
    }

    #[test]
    fn stem_accumulates_plain_lines_with_single_space() {
        let state = AssemblerState::CollectingStem(QuestionDraft::with_stem("Read the passage"));
        let t = transition(state, &line(2, plain("and answer.")), false);
        assert_eq!(
            t.next,
            AssemblerState::CollectingStem(QuestionDraft::with_stem("Read the passage and answer."))
        );
    }

    #[test]
    fn unnumbered_stem_is_flushed_by_next_question_like_line() {
        let state = AssemblerState::CollectingStem(QuestionDraft::with_stem("Mathematics Paper 1"));
        let t = transition(state, &line(2, plain("Which is a mammal?")), true);
        assert_eq!(t.flushed, Some(QuestionDraft::with_stem("Mathematics Paper 1")));
        assert_eq!(
            t.next,
            AssemblerState::CollectingStem(QuestionDraft::with_stem("Which is a mammal?"))
        );
    }

    #[test]
    fn numbered_stem_keeps_plain_continuation_lines() {
        let state = AssemblerState::CollectingStem(QuestionDraft::numbered("Read the passage"));
        let t = transition(state, &line(2, plain("and answer.")), true);
        assert!(t.flushed.is_none());
        assert_eq!(
            t.next,
            AssemblerState::CollectingStem(QuestionDraft::numbered("Read the passage and answer."))
        );
    }

    #[test]
    fn option_line_moves_stem_to_options_without_losing_it() {
        let state = AssemblerState::CollectingStem(QuestionDraft::with_stem("2+2?"));
        let t = transition(state, &line(2, option('B', "4")), false);
        let AssemblerState::CollectingOptionsAndAnswer(draft) = t.next else {
            panic!("expected options state");
        };
        assert_eq!(draft.options.get(&OptionLetter::B).map(String::as_str), Some("4"));
    }

    #[test]
    fn new_question_start_flushes_current_stem() {
        let state = AssemblerState::CollectingStem(QuestionDraft::with_stem("First"));
        let t = transition(state, &line(3, start("Second")), false);
        assert_eq!(t.flushed, Some(QuestionDraft::with_stem("First")));
        assert_eq!(t.next, AssemblerState::CollectingStem(QuestionDraft::numbered("Second")));
    }

    #[test]
    fn last_option_and_last_answer_win() {
        let mut state = AssemblerState::CollectingOptionsAndAnswer(QuestionDraft::with_stem("Q"));
        for kind in [
            option('A', "first"),
            LineKind::Answer { letter: 'A' },
            option('A', "second"),
            LineKind::Answer { letter: 'C' },
        ] {
            state = transition(state, &line(1, kind), false).next;
        }
        let AssemblerState::CollectingOptionsAndAnswer(draft) = state else {
            panic!("expected options state");
        };
        assert_eq!(draft.options[&OptionLetter::A], "second");
        assert_eq!(draft.answer, Some('C'));
    }

    #[test]
    fn plain_after_options_flushes_and_reprocesses_in_idle() {
        let mut draft = QuestionDraft::with_stem("Q1");
        draft.options.insert(OptionLetter::A, "x".to_string());
        let state = AssemblerState::CollectingOptionsAndAnswer(draft.clone());

        let t = transition(state, &line(5, plain("Next stem")), true);
        assert_eq!(t.flushed, Some(draft));
        assert_eq!(t.next, AssemblerState::CollectingStem(QuestionDraft::with_stem("Next stem")));
    }

    #[test]
    fn out_of_range_option_is_reported_and_state_kept() {
        let state = AssemblerState::CollectingOptionsAndAnswer(QuestionDraft::with_stem("Q"));
        let t = transition(state.clone(), &line(7, option('F', "None")), false);
        assert_eq!(t.next, state);
        assert_eq!(
            t.warnings,
            vec![ImportWarning::InvalidOptionLetter { line: 7, letter: 'F' }]
        );
    }

    #[test]
    fn finalize_blank_draft_is_silent() {
        let (q, w) = finalize(QuestionDraft::default(), 1, OptionlessPolicy::Drop);
        assert!(q.is_none());
        assert!(w.is_empty());
    }

    #[test]
    fn finalize_drops_optionless_block_by_default() {
        let (q, w) = finalize(QuestionDraft::with_stem("Lonely stem"), 2, OptionlessPolicy::Drop);
        assert!(q.is_none());
        assert_eq!(
            w,
            vec![ImportWarning::NoOptions {
                question: 2,
                stem: "Lonely stem".to_string(),
                dropped: true
            }]
        );
    }

    #[test]
    fn finalize_can_emit_optionless_block() {
        let (q, w) = finalize(
            QuestionDraft::with_stem("Lonely stem"),
            2,
            OptionlessPolicy::EmitWithWarning,
        );
        let q = q.expect("question kept");
        assert_eq!(q.text, "Lonely stem");
        assert!(w.contains(&ImportWarning::MissingAnswer { question: 2 }));
        assert!(w.iter().any(|w| matches!(w, ImportWarning::NoOptions { dropped: false, .. })));
    }

    #[test]
    fn finalize_keeps_answer_pointing_at_empty_option() {
        let mut draft = QuestionDraft::with_stem("Q");
        draft.options.insert(OptionLetter::A, "x".to_string());
        draft.answer = Some('D');

        let (q, w) = finalize(draft, 1, OptionlessPolicy::Drop);
        assert_eq!(q.unwrap().correct, Some(OptionLetter::D));
        assert_eq!(
            w,
            vec![ImportWarning::AnswerWithoutOption {
                question: 1,
                letter: OptionLetter::D
            }]
        );
    }

    #[test]
    fn finalize_rejects_out_of_range_answer() {
        let mut draft = QuestionDraft::with_stem("Q");
        draft.options.insert(OptionLetter::A, "x".to_string());
        draft.answer = Some('F');

        let (q, w) = finalize(draft, 4, OptionlessPolicy::Drop);
        assert_eq!(q.unwrap().correct, None);
        assert_eq!(w, vec![ImportWarning::InvalidAnswerLetter { question: 4, letter: 'F' }]);
    }

    #[test]
    fn end_of_input_flushes_in_progress_question() {
        assert_eq!(finish(AssemblerState::Idle), None);
        assert_eq!(
            finish(AssemblerState::CollectingStem(QuestionDraft::with_stem("Q"))),
            Some(QuestionDraft::with_stem("Q"))
        );
    }
}
