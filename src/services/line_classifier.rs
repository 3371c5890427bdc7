//! 行分类 - 业务能力层
//!
//! 只负责"这一行是什么"，不关心题目组装

use regex::Regex;
use std::sync::LazyLock;

use crate::services::text_normalizer::Line;

/// 判断"像题干"时向后查看的行数
pub const QUESTION_LOOKAHEAD: usize = 6;

/// `ANSWER: B` / `Ans - c` / `answer=(d)`
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^ans(?:wer)?\s*[:=\-]?\s*[(\[]?([a-z])\b").expect("answer regex")
});

/// `A. text` / `A) text` / `(a) text` / `[B] text` / `C: text` / `D - text`
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[(\[]?([A-Ea-e])[)\].:\-]\s*(.*)$").expect("option regex")
});

/// 超出 A–E 的大写选项，如 `F) None of the above`
static OUT_OF_RANGE_OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[(\[]?([F-Z])[)\].:]\s+(.+)$").expect("out-of-range option regex")
});

/// `1. text` / `Q2) text` / `q 3: text`
static QUESTION_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Q\s*)?(\d{1,3})[).:\-]\s*(.+)$").expect("question start regex")
});

/// 行的类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// 答案行，字母已转大写，可能超出 A–E
    Answer { letter: char },
    /// 选项行，字母已转大写，可能超出 A–E
    Option { letter: char, text: String },
    /// 带编号的题干起始行，`text` 不含编号
    QuestionStart { number: u32, text: String },
    /// 其他文本
    Plain { text: String },
}

/// 带类别的行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub number: usize,
    pub kind: LineKind,
}

impl ClassifiedLine {
    /// A–E 范围内的选项行
    pub fn is_valid_option(&self) -> bool {
        matches!(self.kind, LineKind::Option { letter, .. } if ('A'..='E').contains(&letter))
    }
}

/// 按 答案 → 选项 → 题号 → 普通文本 的优先级分类一行
pub fn classify(line: &Line) -> ClassifiedLine {
    let text = line.text.as_str();

    let kind = if let Some(caps) = ANSWER_RE.captures(text) {
        LineKind::Answer {
            letter: first_upper(&caps[1]),
        }
    } else if let Some(caps) = OPTION_RE
        .captures(text)
        .or_else(|| OUT_OF_RANGE_OPTION_RE.captures(text))
    {
        LineKind::Option {
            letter: first_upper(&caps[1]),
            text: caps[2].trim().to_string(),
        }
    } else if let Some(caps) = QUESTION_START_RE.captures(text) {
        LineKind::QuestionStart {
            number: caps[1].parse().unwrap_or(0),
            text: caps[2].trim().to_string(),
        }
    } else {
        LineKind::Plain {
            text: text.to_string(),
        }
    };

    ClassifiedLine {
        number: line.number,
        kind,
    }
}

pub fn classify_all(lines: &[Line]) -> Vec<ClassifiedLine> {
    lines.iter().map(classify).collect()
}

/// 没有显式编号时判断一行是否"像题干"：
/// 本身不是选项/答案行，且后面 6 行内出现 A–E 选项行
pub fn looks_like_question(lines: &[ClassifiedLine], idx: usize) -> bool {
    let Some(line) = lines.get(idx) else {
        return false;
    };
    if matches!(line.kind, LineKind::Option { .. } | LineKind::Answer { .. }) {
        return false;
    }

    lines
        .iter()
        .skip(idx + 1)
        .take(QUESTION_LOOKAHEAD)
        .any(ClassifiedLine::is_valid_option)
}

fn first_upper(s: &str) -> char {
    s.chars().next().map(|c| c.to_ascii_uppercase()).unwrap_or(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(text: &str) -> LineKind {
        classify(&Line {
            text: text.to_string(),
            number: 1,
        })
        .kind
    }

    #[test]
    fn answer_variants() {
        assert_eq!(kind_of("ANSWER: B"), LineKind::Answer { letter: 'B' });
        assert_eq!(kind_of("ans - a"), LineKind::Answer { letter: 'A' });
        assert_eq!(kind_of("Answer=(d)"), LineKind::Answer { letter: 'D' });
        assert_eq!(kind_of("Ans c"), LineKind::Answer { letter: 'C' });
        assert_eq!(kind_of("ANSWER: F"), LineKind::Answer { letter: 'F' });
    }

    #[test]
    fn prose_starting_with_answer_is_not_an_answer_line() {
        assert!(matches!(
            kind_of("Answer the following questions"),
            LineKind::Plain { .. }
        ));
        assert!(matches!(kind_of("Answer all"), LineKind::Plain { .. }));
    }

    #[test]
    fn option_variants() {
        for (line, letter, text) in [
            ("A. Paris", 'A', "Paris"),
            ("b) Lyon", 'B', "Lyon"),
            ("(c) Nice", 'C', "Nice"),
            ("[D] Lille", 'D', "Lille"),
            ("E: none", 'E', "none"),
            ("A- 3", 'A', "3"),
        ] {
            assert_eq!(
                kind_of(line),
                LineKind::Option {
                    letter,
                    text: text.to_string()
                },
                "line: {line}"
            );
        }
    }

    #[test]
    fn out_of_range_uppercase_option_is_still_an_option_line() {
        assert_eq!(
            kind_of("F) None of the above"),
            LineKind::Option {
                letter: 'F',
                text: "None of the above".to_string()
            }
        );
        assert!(matches!(kind_of("x-rays are waves"), LineKind::Plain { .. }));
    }

    #[test]
    fn numbered_question_start() {
        assert_eq!(
            kind_of("1. What is 2+2?"),
            LineKind::QuestionStart {
                number: 1,
                text: "What is 2+2?".to_string()
            }
        );
        assert_eq!(
            kind_of("Q12) Define osmosis"),
            LineKind::QuestionStart {
                number: 12,
                text: "Define osmosis".to_string()
            }
        );
        assert!(matches!(kind_of("2025 was a good year"), LineKind::Plain { .. }));
    }

    #[test]
    fn lookahead_detects_unnumbered_question() {
        let lines: Vec<_> = ["Which is a mammal?", "Pick one", "A. Whale", "B. Shark", "ANSWER: A"]
            .iter()
            .enumerate()
            .map(|(i, t)| classify(&Line {
                text: t.to_string(),
                number: i + 1,
            }))
            .collect();

        assert!(looks_like_question(&lines, 0));
        assert!(looks_like_question(&lines, 1));
        assert!(!looks_like_question(&lines, 2));
        assert!(!looks_like_question(&lines, 4));
    }

    #[test]
    fn lookahead_window_is_six_lines() {
        let mut texts = vec!["Stem".to_string()];
        texts.extend((0..6).map(|i| format!("filler {i}")));
        texts.push("A. late option".to_string());
        let lines: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| classify(&Line {
                text: t.clone(),
                number: i + 1,
            }))
            .collect();

        assert!(!looks_like_question(&lines, 0));
        assert!(looks_like_question(&lines, 1));
    }
}
