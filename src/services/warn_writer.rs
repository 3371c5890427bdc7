//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 警告写入服务
///
/// 职责：
/// - 将导入时产生的警告追加到 warn.txt
/// - 每条警告一行，带试卷标识
/// - 同一文档的警告一次写入，不与其他文档交错
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 写入一份文档的全部警告
    ///
    /// # 参数
    /// - `paper`: 试卷标识（标题或 id）
    /// - `source`: 来源文件名
    /// - `warnings`: 解析警告，按出现顺序
    ///
    /// # 返回
    /// 没有警告时不创建文件
    pub async fn write(&self, paper: &str, source: &str, warnings: &[String]) -> Result<()> {
        if warnings.is_empty() {
            return Ok(());
        }

        debug!(
            "写入警告: 试卷 {} | 文件 {} | {} 条",
            paper,
            source,
            warnings.len()
        );

        let content: String = warnings
            .iter()
            .map(|w| format!("试卷 {} | 文件 {} | {}\n", paper, source, w))
            .collect();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await
            .with_context(|| format!("无法打开警告文件: {}", self.warn_file_path))?;

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
