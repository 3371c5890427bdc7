//! 院系学号格式 - 业务能力层
//!
//! 由格式预览（如 `ECNS/AD/2024/001`）推导校验规则，和编号分配相互独立

use regex::Regex;

use crate::error::ValidationError;

/// 院系的学号格式
#[derive(Debug, Clone)]
pub struct AdmissionFormat {
    preview: String,
    pattern: Regex,
}

impl AdmissionFormat {
    /// 从预览推导：保留第一段前缀，其余固定为 `AD/四位年份/三位序号`
    pub fn from_preview(preview: &str) -> Result<Self, ValidationError> {
        let prefix = preview
            .split('/')
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ValidationError::InvalidFormatPreview(preview.to_string()))?;

        let pattern = format!(r"^{}/AD/\d{{4}}/\d{{3}}$", regex::escape(prefix));
        let pattern = Regex::new(&pattern)
            .map_err(|_| ValidationError::InvalidFormatPreview(preview.to_string()))?;

        Ok(Self {
            preview: preview.to_string(),
            pattern,
        })
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, admission_no: &str) -> bool {
        self.pattern.is_match(admission_no.trim())
    }

    pub fn validate(&self, admission_no: &str) -> Result<(), ValidationError> {
        if self.matches(admission_no) {
            Ok(())
        } else {
            Err(ValidationError::AdmissionFormatMismatch {
                admission_no: admission_no.to_string(),
                pattern: self.pattern().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_pattern_from_preview() {
        let format = AdmissionFormat::from_preview("ECNS/AD/2024/001").unwrap();
        assert_eq!(format.pattern(), r"^ECNS/AD/\d{4}/\d{3}$");
        assert!(format.matches("ECNS/AD/2025/117"));
        assert!(!format.matches("ECNS/AD/25/117"));
        assert!(!format.matches("MED/AD/2025/117"));
    }

    #[test]
    fn prefix_is_escaped() {
        let format = AdmissionFormat::from_preview("SCI.A/AD/2024/001").unwrap();
        assert!(format.matches("SCI.A/AD/2024/010"));
        assert!(!format.matches("SCIxA/AD/2024/010"));
    }

    #[test]
    fn mismatch_names_the_pattern() {
        let format = AdmissionFormat::from_preview("ECNS/AD/2024/001").unwrap();
        let err = format.validate("12345").unwrap_err();
        assert!(err.to_string().contains("ECNS"));
        assert!(AdmissionFormat::from_preview("  /AD").is_err());
    }
}
