//! 离线同步合并 - 业务能力层
//!
//! 上传：按 client_id 幂等合并设备批次；下载：返回自设备上次版本号之后的变更。

use std::future::Future;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::sync::{DownloadSnapshot, OfflineExam, OfflineResult, SyncBatch, SyncReceipt};

/// 单条记录的合并结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// 新写入
    Merged,
    /// client_id 已存在，未重复写入
    AlreadyMerged,
}

/// 同步合并所需的存储能力
pub trait SyncStore: Send + Sync {
    fn merge_exam(&self, exam: &OfflineExam) -> impl Future<Output = AppResult<MergeOutcome>> + Send;

    fn merge_result(&self, result: &OfflineResult) -> impl Future<Output = AppResult<MergeOutcome>> + Send;

    /// 当前全局版本号
    fn current_revision(&self) -> impl Future<Output = AppResult<i64>> + Send;

    /// 版本号大于 `since` 的考试与学生，以及当前版本号
    fn changes_since(&self, since: i64) -> impl Future<Output = AppResult<DownloadSnapshot>> + Send;
}

/// 同步合并器
pub struct SyncReconciler<S> {
    store: S,
}

impl<S: SyncStore> SyncReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 合并设备上传的批次
    ///
    /// 考试先于成绩合并；已标记 synced 的记录直接跳过。
    ///
    /// # 返回
    /// 返回合并回执，设备依据 `accepted_client_ids` 标记已同步
    pub async fn upload(&self, batch: &SyncBatch) -> AppResult<SyncReceipt> {
        let mut receipt = SyncReceipt::default();

        for exam in &batch.exams {
            if exam.synced {
                receipt.skipped += 1;
                continue;
            }
            let outcome = self.store.merge_exam(exam).await?;
            record(&mut receipt, outcome, exam.client_id);
        }

        for result in &batch.results {
            if result.synced {
                receipt.skipped += 1;
                continue;
            }
            let outcome = self.store.merge_result(result).await?;
            record(&mut receipt, outcome, result.client_id);
        }

        receipt.revision = self.store.current_revision().await?;

        info!(
            "🔄 同步上传: 新合并 {}, 重复 {}, 跳过 {} (版本 {})",
            receipt.merged, receipt.already_merged, receipt.skipped, receipt.revision
        );
        Ok(receipt)
    }

    /// 设备下载自 `since` 之后的变更
    ///
    /// 首次同步传 0
    pub async fn download(&self, since: i64) -> AppResult<DownloadSnapshot> {
        let snapshot = self.store.changes_since(since).await?;
        debug!(
            "同步下载: 版本 {} → {}, 考试 {} 条, 学生 {} 条",
            since,
            snapshot.revision,
            snapshot.exams.len(),
            snapshot.students.len()
        );
        Ok(snapshot)
    }
}

fn record(receipt: &mut SyncReceipt, outcome: MergeOutcome, client_id: uuid::Uuid) {
    match outcome {
        MergeOutcome::Merged => receipt.merged += 1,
        MergeOutcome::AlreadyMerged => receipt.already_merged += 1,
    }
    receipt.accepted_client_ids.push(client_id);
}
