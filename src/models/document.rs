use phf::phf_map;
use std::path::Path;

use crate::error::ExtractionError;

/// 文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// 纯文本（.txt）
    PlainText,
    /// Word 文档（.docx）
    RichDocument,
}

/// 扩展名 → 文档类型
static KIND_BY_EXTENSION: phf::Map<&'static str, DocumentKind> = phf_map! {
    "txt" => DocumentKind::PlainText,
    "text" => DocumentKind::PlainText,
    "docx" => DocumentKind::RichDocument,
};

impl DocumentKind {
    /// 根据扩展名判断文档类型（大小写不敏感）
    pub fn from_extension(extension: &str) -> Option<Self> {
        KIND_BY_EXTENSION
            .get(extension.to_ascii_lowercase().as_str())
            .copied()
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }

    /// 同 `from_path`，不支持时返回 `UnsupportedFormat`
    pub fn detect(path: &Path) -> Result<Self, ExtractionError> {
        Self::from_path(path).ok_or_else(|| ExtractionError::UnsupportedFormat {
            extension: path
                .extension()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        })
    }
}

/// 一次导入调用期间存在的原始文档
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// 文件名（仅用于日志）
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes,
        }
    }

    pub fn plain_text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, DocumentKind::PlainText, text.as_bytes().to_vec())
    }

    /// 不带扩展名的文件名，用作试卷 ID
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_detected_from_extension() {
        assert_eq!(
            DocumentKind::from_path(Path::new("bank/Physics.DOCX")),
            Some(DocumentKind::RichDocument)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("maths.txt")),
            Some(DocumentKind::PlainText)
        );
        assert_eq!(DocumentKind::from_path(Path::new("scan.pdf")), None);

        let err = DocumentKind::detect(Path::new("scan.pdf")).unwrap_err();
        assert!(err.to_string().contains("pdf"));
    }

    #[test]
    fn stem_drops_extension() {
        let doc = RawDocument::plain_text("biology-term1.txt", "");
        assert_eq!(doc.stem(), "biology-term1");
    }
}
