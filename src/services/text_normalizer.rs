//! 文本规范化 - 业务能力层
//!
//! 把原始文本切成去掉首尾空白的非空行

/// 源文档中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 去掉首尾空白后的内容，永远非空
    pub text: String,
    /// 在源文本中的行号（从 1 开始，统一换行符后计算）
    pub number: usize,
}

/// 规范化换行符（`\r\n`、`\r`、`\n`）、逐行 trim 并丢弃空行
///
/// 不会失败；空文档返回空列表。
pub fn normalize(text: &str) -> Vec<Line> {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    unified
        .split('\n')
        .enumerate()
        .filter_map(|(idx, raw)| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Line {
                    text: trimmed.to_string(),
                    number: idx + 1,
                })
            }
        })
        .collect()
}
