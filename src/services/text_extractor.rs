//! 文档文本提取 - 业务能力层
//!
//! 只负责"把文档容器变成纯文本"能力，不关心题目格式

use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use zip::ZipArchive;

use crate::error::ExtractionError;
use crate::models::document::{DocumentKind, RawDocument};

/// docx 正文部件
const DOCUMENT_PART: &str = "word/document.xml";

/// 段落结束、换行、制表符、空文本节点和文本节点
///
/// 自闭合的 `<w:t/>` 必须排在前面，否则会被当作开始标签一直匹配到下一个 `</w:t>`
static DOCX_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)</w:p>|<w:br\s*/>|<w:cr\s*/>|<w:tab\s*/>|<w:t(?:\s[^>]*)?/>|<w:t(?:\s[^>/]*)?>(.*?)</w:t>",
    )
    .expect("docx token regex")
});

/// 预定义实体和数字字符引用
static XML_ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:(lt|gt|quot|apos|amp)|#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6}));")
        .expect("xml entity regex")
});

/// 文档文本提取能力
///
/// 纯文本原样返回，富文本容器尽量提取文本；容器不可读时返回 `ExtractionError`
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, document: &RawDocument) -> Result<String, ExtractionError>;
}

/// 默认实现：.txt 按 UTF-8 解码，.docx 读取 `word/document.xml`
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTextExtractor;

impl TextExtractor for DocumentTextExtractor {
    fn extract_text(&self, document: &RawDocument) -> Result<String, ExtractionError> {
        match document.kind {
            DocumentKind::PlainText => decode_plain_text(&document.bytes),
            DocumentKind::RichDocument => extract_docx_text(&document.bytes),
        }
    }
}

fn decode_plain_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|source| ExtractionError::InvalidEncoding { source })
}

/// 从 docx 字节中提取纯文本，每个段落一行
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ExtractionError::UnreadableContainer {
            source: Box::new(e),
        }
    })?;

    let mut xml = String::new();
    {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
            ExtractionError::MissingDocumentPart {
                part: DOCUMENT_PART.to_string(),
            }
        })?;
        part.read_to_string(&mut xml)
            .map_err(|e| ExtractionError::UnreadableContainer {
                source: Box::new(e),
            })?;
    }

    Ok(document_xml_to_text(&xml))
}

/// 把 WordprocessingML 正文转成纯文本
pub fn document_xml_to_text(xml: &str) -> String {
    let mut text = String::new();

    for caps in DOCX_TOKEN_RE.captures_iter(xml) {
        match caps.get(1) {
            Some(run) => text.push_str(&unescape_xml(run.as_str())),
            None => {
                let token = &caps[0];
                if token.starts_with("<w:tab") {
                    text.push('\t');
                } else if !token.starts_with("<w:t") {
                    text.push('\n');
                }
            }
        }
    }

    text
}

/// 单遍替换，`&amp;lt;` 只还原一层
fn unescape_xml(s: &str) -> String {
    XML_ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let decoded = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(name), _, _) => match name.as_str() {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => Some('&'),
                },
                (_, Some(dec), _) => dec.as_str().parse().ok().and_then(char::from_u32),
                (_, _, Some(hex)) => u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32),
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn docx_with(xml: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, FileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_become_lines_and_entities_are_unescaped() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>1. Is 2 &lt; 3</w:t></w:r><w:r><w:t xml:space="preserve"> &amp; true?</w:t></w:r></w:p>
            <w:p><w:r><w:t>A. Yes</w:t></w:r></w:p>
            <w:p><w:r><w:t>B.</w:t><w:tab/><w:t>No</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let text = document_xml_to_text(xml);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["1. Is 2 < 3 & true?", "A. Yes", "B.\tNo"]);
    }

    #[test]
    fn self_closing_text_node_does_not_swallow_next_paragraph() {
        let xml = r#"<w:p><w:r><w:t xml:space="preserve"/></w:r></w:p><w:p><w:r><w:t>1. Q?</w:t></w:r></w:p><w:p><w:r><w:t/><w:t>A. x</w:t></w:r></w:p>"#;

        let text = document_xml_to_text(xml);
        assert!(!text.contains('<'), "{text:?}");
        let lines: Vec<_> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["1. Q?", "A. x"]);
    }

    #[test]
    fn numeric_character_references_are_unescaped() {
        assert_eq!(unescape_xml("caf&#233; &#x4E2D; &#X41;"), "café 中 A");
        assert_eq!(unescape_xml("&amp;lt; stays &lt;"), "&lt; stays <");
        assert_eq!(unescape_xml("&#xFFFFFF; &unknown;"), "&#xFFFFFF; &unknown;");
    }

    #[test]
    fn extracts_from_docx_container() {
        let bytes = docx_with("<w:p><w:r><w:t>ANSWER: A</w:t></w:r></w:p>");
        let doc = RawDocument::new("paper.docx", DocumentKind::RichDocument, bytes);
        let text = DocumentTextExtractor.extract_text(&doc).unwrap();
        assert_eq!(text.trim(), "ANSWER: A");
    }

    #[test]
    fn unreadable_container_is_an_extraction_error() {
        let doc = RawDocument::new("broken.docx", DocumentKind::RichDocument, b"not a zip".to_vec());
        let err = DocumentTextExtractor.extract_text(&doc).unwrap_err();
        assert!(matches!(err, ExtractionError::UnreadableContainer { .. }));
    }

    #[test]
    fn docx_without_body_part_is_reported() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("docProps/app.xml", FileOptions::default()).unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = extract_docx_text(&bytes).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingDocumentPart { .. }));
    }

    #[test]
    fn plain_text_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"1. Q?");
        let doc = RawDocument::new("q.txt", DocumentKind::PlainText, bytes);
        assert_eq!(DocumentTextExtractor.extract_text(&doc).unwrap(), "1. Q?");
    }
}
