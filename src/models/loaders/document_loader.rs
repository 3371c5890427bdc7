use crate::models::document::{DocumentKind, RawDocument};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取单个题目文档（.txt / .docx）
pub async fn load_document(path: &Path) -> Result<RawDocument> {
    let kind = DocumentKind::detect(path)
        .with_context(|| format!("无法导入文件: {}", path.display()))?;

    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(RawDocument::new(name, kind, bytes))
}

/// 从文件夹中加载所有可导入的题目文档，按文件名排序
///
/// 其他扩展名的文件直接忽略，单个文件读取失败只记录警告
pub async fn load_all_documents(folder_path: &str) -> Result<Vec<(PathBuf, RawDocument)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if DocumentKind::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_document(&path).await {
            Ok(doc) => documents.push((path, doc)),
            Err(e) => tracing::warn!("加载文件失败 {}: {:#}", path.display(), e),
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_only_supported_files_in_name_order() {
        let dir = std::env::temp_dir().join(format!("exam_core_docs_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.txt"), "1. Q?\nA. x\nANSWER: A").unwrap();
        std::fs::write(dir.join("a.txt"), "1. Q?\nA. y\nANSWER: A").unwrap();
        std::fs::write(dir.join("notes.md"), "ignored").unwrap();

        let docs = load_all_documents(dir.to_str().unwrap()).await.unwrap();
        let names: Vec<_> = docs.iter().map(|(_, d)| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(docs[0].1.kind, DocumentKind::PlainText);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        assert!(load_all_documents("/definitely/not/here").await.is_err());
    }
}
