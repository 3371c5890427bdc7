//! 文档导入上下文
//!
//! 封装"我正在把哪个文件导入哪张试卷"这一信息

use std::fmt::Display;

/// 文档导入上下文
#[derive(Debug, Clone)]
pub struct ImportCtx {
    /// 试卷标题（默认取文件名去掉扩展名）
    pub paper_title: String,

    /// 来源文件名
    pub file_name: String,

    /// 文档索引（仅用于日志显示，从 1 开始）
    pub file_index: usize,
}

impl ImportCtx {
    /// 创建新的导入上下文
    pub fn new(paper_title: String, file_name: String, file_index: usize) -> Self {
        Self {
            paper_title,
            file_name,
            file_index,
        }
    }
}

impl Display for ImportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[试卷 {}]", self.file_index)
    }
}
