/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// `RUST_LOG` 优先；未设置时默认 `info`，详细模式为 `debug`。
/// 重复调用不会报错（测试中可能多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回是否成功初始化
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n导入日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_concurrent`: 最大并发数
/// - `database_path`: 数据库路径
pub fn log_startup(max_concurrent: usize, database_path: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量导入与同步模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("🗄️ 数据库: {}", database_path);
    info!("{}", "=".repeat(60));
}

/// 记录文档加载信息
///
/// # 参数
/// - `total`: 文档总数
/// - `max_concurrent`: 最大并发数
pub fn log_documents_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待导入的文档", total);
    info!("📋 最多同时导入 {} 个\n", max_concurrent);
}

/// 记录同步批次开始信息
///
/// # 参数
/// - `index`: 批次编号（从 1 开始）
/// - `total`: 批次总数
/// - `source`: 来源文件
/// - `records`: 批次内记录数
pub fn log_sync_batch_start(index: usize, total: usize, source: &str, records: usize) {
    info!("\n{}", "─".repeat(60));
    info!("🔄 合并第 {}/{} 个同步批次: {} ({} 条记录)", index, total, source, records);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 导入与同步统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 导入成功: {}/{}", stats.imported, stats.documents);
    info!("❌ 导入失败: {}", stats.failed);
    info!("📝 写入题目: {} (警告 {} 条)", stats.questions, stats.warnings);
    info!(
        "🔄 同步合并: 新 {} / 重复 {} / 跳过 {}",
        stats.merged, stats.already_merged, stats.skipped
    );
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub documents: usize,
    pub imported: usize,
    pub failed: usize,
    pub questions: usize,
    pub warnings: usize,
    pub merged: usize,
    pub already_merged: usize,
    pub skipped: usize,
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_characters_not_bytes() {
        assert_eq!(truncate_text("短文本", 5), "短文本");
        assert_eq!(truncate_text("一二三四五六", 3), "一二三...");
    }

    #[test]
    fn init_can_be_called_twice() {
        init(false);
        init(true);
    }
}
