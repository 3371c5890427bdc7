//! 单个文档处理器 - 编排层
//!
//! ## 职责
//!
//! 把一个已加载的文档交给 `ImportFlow`，试卷标题取文件名（去掉扩展名），
//! 并输出单个文档的统计信息。

use crate::models::document::RawDocument;
use crate::workflow::{ImportCtx, ImportFlow, ImportOutcome};
use anyhow::Result;
use tracing::{error, info};

/// 处理单个文档
///
/// # 参数
/// - `flow`: 导入流程（多个任务共享）
/// - `document`: 文档内容
/// - `file_index`: 文档索引（用于日志）
///
/// # 返回
/// 返回导入结果
pub async fn process_paper(
    flow: &ImportFlow,
    document: RawDocument,
    file_index: usize,
) -> Result<ImportOutcome> {
    let ctx = ImportCtx::new(document.stem(), document.name.clone(), file_index);

    match flow.run(document, &ctx).await {
        Ok(outcome) => {
            log_paper_summary(&ctx, &outcome);
            Ok(outcome)
        }
        Err(e) => {
            error!("{} ❌ 导入失败 ({}): {}", ctx, ctx.file_name, e);
            Err(e.into())
        }
    }
}

fn log_paper_summary(ctx: &ImportCtx, outcome: &ImportOutcome) {
    info!(
        "{} 📊 {} → 试卷 #{}: 写入 {}/{} 道题目, 警告 {} 条",
        ctx,
        ctx.file_name,
        outcome.paper_id,
        outcome.stored,
        outcome.result.questions.len(),
        outcome.result.warnings.len()
    );
}
