use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// 客观题选项字母，只允许 A–E
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
    E,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 5] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
        OptionLetter::E,
    ];

    /// 从字符解析（大小写不敏感），A–E 之外返回 None
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(OptionLetter::A),
            'B' => Some(OptionLetter::B),
            'C' => Some(OptionLetter::C),
            'D' => Some(OptionLetter::D),
            'E' => Some(OptionLetter::E),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            OptionLetter::A => 'A',
            OptionLetter::B => 'B',
            OptionLetter::C => 'C',
            OptionLetter::D => 'D',
            OptionLetter::E => 'E',
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// 解析得到的一道客观题
///
/// `options` 始终包含 A–E 五个键，缺失的选项为空字符串。
/// `correct` 为 None 时序列化为 `""`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuestion {
    pub text: String,
    pub options: BTreeMap<OptionLetter, String>,
    #[serde(serialize_with = "serialize_correct")]
    pub correct: Option<OptionLetter>,
}

impl ParsedQuestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: OptionLetter::ALL
                .iter()
                .map(|letter| (*letter, String::new()))
                .collect(),
            correct: None,
        }
    }

    /// 获取某个选项的文本，缺失时为空字符串
    pub fn option(&self, letter: OptionLetter) -> &str {
        self.options.get(&letter).map(String::as_str).unwrap_or("")
    }

    pub fn set_option(&mut self, letter: OptionLetter, text: impl Into<String>) {
        self.options.insert(letter, text.into());
    }

    /// 是否至少有一个非空选项
    pub fn has_any_option(&self) -> bool {
        self.options.values().any(|v| !v.trim().is_empty())
    }

    /// 正确答案字母，未设置时为空字符串
    pub fn correct_str(&self) -> String {
        self.correct.map(|l| l.to_string()).unwrap_or_default()
    }
}

fn serialize_correct<S>(correct: &Option<OptionLetter>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match correct {
        Some(letter) => serializer.serialize_str(&letter.to_string()),
        None => serializer.serialize_str(""),
    }
}

/// 一次导入的结果：题目列表 + 警告列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub questions: Vec<ParsedQuestion>,
    pub warnings: Vec<String>,
}
