use crate::models::sync::SyncBatch;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 JSON 文件加载同步批次
pub async fn load_sync_batch(path: &Path) -> Result<SyncBatch> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取同步文件: {}", path.display()))?;

    let batch: SyncBatch = serde_json::from_str(&content)
        .with_context(|| format!("无法解析同步文件: {}", path.display()))?;

    Ok(batch)
}

/// 加载收件箱中所有 `.json` 同步批次，按文件名排序
///
/// 收件箱不存在时返回空列表
pub async fn load_all_sync_batches(folder_path: &str) -> Result<Vec<(PathBuf, SyncBatch)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        tracing::debug!("同步收件箱不存在: {}", folder_path);
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut batches = Vec::new();
    for path in paths {
        match load_sync_batch(&path).await {
            Ok(batch) => {
                tracing::info!(
                    "成功加载同步批次 {} ({} 条记录)",
                    path.display(),
                    batch.len()
                );
                batches.push((path, batch));
            }
            Err(e) => tracing::warn!("加载同步批次失败 {}: {:#}", path.display(), e),
        }
    }

    Ok(batches)
}
