use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 待导入题目文档（.txt / .docx）存放目录
    pub import_folder: String,
    /// 离线设备上传的同步批次（.json）存放目录
    pub sync_inbox_folder: String,
    /// 同时导入的文档数量
    pub max_concurrent_imports: usize,
    // --- 学号分配 ---
    /// 系统学号前缀，如 adx-2025-001 中的 "adx"
    pub roll_number_prefix: String,
    /// 唯一约束冲突时的最大尝试次数
    pub allocation_max_attempts: usize,
    /// 重试耗尽后是否退回时间戳编号
    pub allocation_timestamp_fallback: bool,
    // --- 题目导入 ---
    /// 没有任何选项的题目是否仍然输出（带警告）
    pub emit_optionless_questions: bool,
    /// 导入题目的默认分值
    pub default_question_marks: u32,
    // --- 日志 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 导入警告文件
    pub warn_file_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "exam_core.sqlite3".to_string(),
            import_folder: "import".to_string(),
            sync_inbox_folder: "sync_inbox".to_string(),
            max_concurrent_imports: 8,
            roll_number_prefix: "adx".to_string(),
            allocation_max_attempts: 5,
            allocation_timestamp_fallback: false,
            emit_optionless_questions: false,
            default_question_marks: 1,
            verbose_logging: false,
            output_log_file: "import_log.txt".to_string(),
            warn_file_path: "warn.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，文件中未出现的键使用默认值，随后再应用环境变量
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or(self.database_path),
            import_folder: std::env::var("IMPORT_FOLDER").unwrap_or(self.import_folder),
            sync_inbox_folder: std::env::var("SYNC_INBOX_FOLDER").unwrap_or(self.sync_inbox_folder),
            max_concurrent_imports: env_parse("MAX_CONCURRENT_IMPORTS").unwrap_or(self.max_concurrent_imports),
            roll_number_prefix: std::env::var("ROLL_NUMBER_PREFIX").unwrap_or(self.roll_number_prefix),
            allocation_max_attempts: env_parse("ALLOCATION_MAX_ATTEMPTS").unwrap_or(self.allocation_max_attempts),
            allocation_timestamp_fallback: env_parse("ALLOCATION_TIMESTAMP_FALLBACK").unwrap_or(self.allocation_timestamp_fallback),
            emit_optionless_questions: env_parse("EMIT_OPTIONLESS_QUESTIONS").unwrap_or(self.emit_optionless_questions),
            default_question_marks: env_parse("DEFAULT_QUESTION_MARKS").unwrap_or(self.default_question_marks),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            warn_file_path: std::env::var("WARN_FILE_PATH").unwrap_or(self.warn_file_path),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_values_override_defaults_and_missing_keys_keep_them() {
        let parsed: Config = toml::from_str(
            r#"
            roll_number_prefix = "acx"
            allocation_max_attempts = 9
            "#,
        )
        .unwrap();

        assert_eq!(parsed.roll_number_prefix, "acx");
        assert_eq!(parsed.allocation_max_attempts, 9);
        assert_eq!(parsed.default_question_marks, 1);
        assert!(!parsed.emit_optionless_questions);
    }

    #[test]
    fn malformed_toml_file_is_a_config_error() {
        let path = std::env::temp_dir().join(format!("exam_core_bad_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "allocation_max_attempts = \"many\"").unwrap();

        let err = Config::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseFailed { .. }));

        let _ = std::fs::remove_file(path);
    }
}
