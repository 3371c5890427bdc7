use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文档文本提取错误
    #[error("文档提取错误: {0}")]
    Extraction(#[from] ExtractionError),
    /// 编号分配错误
    #[error("编号分配错误: {0}")]
    Allocation(#[from] AllocationError),
    /// 存储层错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 离线同步错误
    #[error("同步错误: {0}")]
    Sync(#[from] SyncError),
    /// 请求数据校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 文档文本提取错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 不支持的文件格式
    #[error("不支持的文件格式: {extension}")]
    UnsupportedFormat { extension: String },
    /// 文档容器无法读取（损坏的 zip 等）
    #[error("无法读取文档容器: {source}")]
    UnreadableContainer {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 文档容器缺少正文部件
    #[error("文档缺少正文部件: {part}")]
    MissingDocumentPart { part: String },
    /// 文本不是合法的 UTF-8
    #[error("文本编码无效: {source}")]
    InvalidEncoding {
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// 编号分配错误
#[derive(Debug, Error)]
pub enum AllocationError {
    /// 重试次数耗尽仍然冲突
    #[error("编号分配失败 ({prefix}-{period}): 已尝试 {attempts} 次仍然冲突")]
    Exhausted {
        prefix: String,
        period: String,
        attempts: usize,
    },
}

/// 存储层错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 唯一约束冲突
    #[error("唯一约束冲突: {field} = {value}")]
    UniquenessConflict { field: String, value: String },
    /// 记录不存在
    #[error("记录不存在: {0}")]
    NotFound(String),
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),
    /// 后台任务执行失败
    #[error("存储任务执行失败: {0}")]
    Task(String),
    /// 已保存的 JSON 字段无法读写
    #[error("记录 JSON 字段损坏: {0}")]
    CorruptJson(#[source] serde_json::Error),
}

/// 离线同步错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 同步批次格式错误
    #[error("同步批次解析失败: {0}")]
    MalformedBatch(#[from] serde_json::Error),
}

/// 请求数据校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 必填字段缺失
    #[error("缺少必填字段: {0}")]
    MissingField(&'static str),
    /// 学号格式与院系要求不符
    #[error("学号 {admission_no} 不符合院系格式 {pattern}")]
    AdmissionFormatMismatch {
        admission_no: String,
        pattern: String,
    },
    /// 学号格式预览无法识别
    #[error("无法识别的学号格式预览: {0}")]
    InvalidFormatPreview(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Storage(StorageError::Database(err))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Extraction(ExtractionError::UnreadableContainer {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Storage(StorageError::Task(err.to_string()))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建唯一约束冲突错误
    pub fn uniqueness_conflict(field: impl Into<String>, value: impl Into<String>) -> Self {
        AppError::Storage(StorageError::UniquenessConflict {
            field: field.into(),
            value: value.into(),
        })
    }

    /// 创建编号分配耗尽错误
    pub fn allocation_exhausted(
        prefix: impl Into<String>,
        period: impl Into<String>,
        attempts: usize,
    ) -> Self {
        AppError::Allocation(AllocationError::Exhausted {
            prefix: prefix.into(),
            period: period.into(),
            attempts,
        })
    }

    /// 调用方重试整个操作是否可能成功
    ///
    /// 编号争用和唯一约束冲突属于瞬时冲突，与"输入无效"区分开
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Allocation(AllocationError::Exhausted { .. })
                | AppError::Storage(StorageError::UniquenessConflict { .. })
        )
    }

    /// 对应的 HTTP 状态码
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Allocation(_) => 409,
            AppError::Storage(StorageError::UniquenessConflict { .. }) => 409,
            AppError::Storage(StorageError::NotFound(_)) => 404,
            AppError::Extraction(_) | AppError::Validation(_) | AppError::Sync(_) => 400,
            _ => 500,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_allocation_is_retryable_conflict() {
        let err = AppError::allocation_exhausted("adx", "2025", 5);
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), 409);
        assert!(err.to_string().contains("adx-2025"));
    }

    #[test]
    fn corrupt_stored_json_is_a_server_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err = AppError::from(StorageError::CorruptJson(json_err));
        assert!(!err.is_retryable());
        assert_eq!(err.http_status(), 500);

        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        assert_eq!(AppError::from(SyncError::from(json_err)).http_status(), 400);
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err = AppError::from(ValidationError::MissingField("email"));
        assert!(!err.is_retryable());
        assert_eq!(err.http_status(), 400);
    }
}
