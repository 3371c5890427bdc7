use std::fmt;
use std::str::FromStr;

/// 序号最少补零位数
pub const MIN_SERIAL_WIDTH: usize = 3;

/// 编号尾部的来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SerialKind {
    /// 按期间递增的序号
    #[default]
    Sequential,
    /// 顺序分配反复冲突后的时间戳兜底，不参与最大序号计算
    Timestamp,
}

/// 形如 `adx-2025-003` 的顺序编号
///
/// 序号部分补零到至少三位，超过三位时按实际位数输出，不截断。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequentialIdentifier {
    pub prefix: String,
    pub period: String,
    pub serial: u64,
    pub kind: SerialKind,
}

impl SequentialIdentifier {
    pub fn new(prefix: impl Into<String>, period: impl Into<String>, serial: u64) -> Self {
        Self {
            prefix: prefix.into(),
            period: period.into(),
            serial,
            kind: SerialKind::Sequential,
        }
    }

    /// 以时间戳（纳秒）代替序号
    pub fn timestamp(prefix: impl Into<String>, period: impl Into<String>, nanos: u64) -> Self {
        Self {
            kind: SerialKind::Timestamp,
            ..Self::new(prefix, period, nanos)
        }
    }

    pub fn is_sequential(&self) -> bool {
        self.kind == SerialKind::Sequential
    }

    /// 补零后的序号
    pub fn padded_serial(&self) -> String {
        format!("{:0width$}", self.serial, width = MIN_SERIAL_WIDTH)
    }
}

impl fmt::Display for SequentialIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.prefix, self.period, self.padded_serial())
    }
}

/// 编号解析失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdentifierError(pub String);

impl fmt::Display for ParseIdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "无法解析编号: {}", self.0)
    }
}

impl std::error::Error for ParseIdentifierError {}

impl FromStr for SequentialIdentifier {
    type Err = ParseIdentifierError;

    /// 从右侧拆分，前缀本身允许包含 `-`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, '-');
        let serial = parts.next().filter(|p| !p.is_empty());
        let period = parts.next().filter(|p| !p.is_empty());
        let prefix = parts.next().filter(|p| !p.is_empty());

        match (prefix, period, serial) {
            (Some(prefix), Some(period), Some(serial)) if serial.chars().all(|c| c.is_ascii_digit()) => {
                let serial = serial
                    .parse::<u64>()
                    .map_err(|_| ParseIdentifierError(s.to_string()))?;
                Ok(Self::new(prefix, period, serial))
            }
            _ => Err(ParseIdentifierError(s.to_string())),
        }
    }
}
