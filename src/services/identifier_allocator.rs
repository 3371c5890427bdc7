//! 顺序编号分配 - 业务能力层
//!
//! 读取当前最大序号 → 计算候选编号 → 尝试写入 → 唯一约束冲突时重试。
//! 不加锁，唯一性由存储层的唯一约束保证。

use chrono::Datelike;
use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::identifier::SequentialIdentifier;

/// 带编号写入的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    Inserted(T),
    /// 编号已被占用
    Conflict,
}

/// 编号分配所需的存储能力
pub trait IdentifierStore: Send + Sync {
    /// 要写入的记录
    type Record: Send + Sync;
    /// 写入成功后返回的记录
    type Saved: Send;

    /// `(prefix, period)` 下曾经用过的最大序号，没有时为 0
    fn max_serial(&self, prefix: &str, period: &str) -> impl Future<Output = AppResult<u64>> + Send;

    /// 以给定编号写入记录，编号唯一约束冲突时返回 `InsertOutcome::Conflict`
    fn insert_with_identifier(
        &self,
        record: &Self::Record,
        identifier: &SequentialIdentifier,
    ) -> impl Future<Output = AppResult<InsertOutcome<Self::Saved>>> + Send;
}

/// 分配策略参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorSettings {
    /// 顺序编号最多尝试次数
    pub max_attempts: usize,
    /// 顺序编号耗尽后是否再用时间戳尝试一次
    pub timestamp_fallback: bool,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            timestamp_fallback: false,
        }
    }
}

impl AllocatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.allocation_max_attempts.max(1),
            timestamp_fallback: config.allocation_timestamp_fallback,
        }
    }
}

/// 当前期间（公历年份）
pub fn current_period() -> String {
    chrono::Local::now().year().to_string()
}

/// 顺序编号分配器
pub struct SequentialIdentifierAllocator<S> {
    store: S,
    settings: AllocatorSettings,
}

impl<S: IdentifierStore> SequentialIdentifierAllocator<S> {
    pub fn new(store: S, settings: AllocatorSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 分配编号并写入记录
    ///
    /// # 返回
    /// 成功时返回 (编号, 已写入记录)；重试耗尽返回 `AllocationError::Exhausted`
    pub async fn allocate(
        &self,
        prefix: &str,
        period: &str,
        record: &S::Record,
    ) -> AppResult<(SequentialIdentifier, S::Saved)> {
        let mut serial = self.store.max_serial(prefix, period).await? + 1;

        for attempt in 1..=self.settings.max_attempts {
            let candidate = SequentialIdentifier::new(prefix, period, serial);
            debug!("尝试编号 {} (第 {}/{} 次)", candidate, attempt, self.settings.max_attempts);

            match self.store.insert_with_identifier(record, &candidate).await? {
                InsertOutcome::Inserted(saved) => {
                    info!("✓ 分配编号 {}", candidate);
                    return Ok((candidate, saved));
                }
                InsertOutcome::Conflict => {
                    warn!(
                        "编号 {} 已被占用 (尝试 {}/{})，重新计算...",
                        candidate, attempt, self.settings.max_attempts
                    );
                    // 冲突说明有并发写入，跳到最新最大值之后
                    let latest = self.store.max_serial(prefix, period).await?;
                    serial = (serial + 1).max(latest + 1);
                }
            }
        }

        if self.settings.timestamp_fallback {
            let candidate = SequentialIdentifier::timestamp(prefix, period, timestamp_nanos());
            warn!("⚠️ 顺序编号重试耗尽，使用时间戳编号 {}", candidate);

            if let InsertOutcome::Inserted(saved) =
                self.store.insert_with_identifier(record, &candidate).await?
            {
                return Ok((candidate, saved));
            }
        }

        Err(AppError::allocation_exhausted(
            prefix,
            period,
            self.settings.max_attempts + usize::from(self.settings.timestamp_fallback),
        ))
    }
}

fn timestamp_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
