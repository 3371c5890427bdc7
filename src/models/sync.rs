use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 离线设备上采集的考试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineResult {
    /// 设备生成的 UUID，服务端以此去重
    pub client_id: Uuid,
    pub exam_code: String,
    pub student_roll_number: String,
    pub score: f64,
    #[serde(default)]
    pub answers: serde_json::Value,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub synced: bool,
}

/// 离线设备上创建的考试
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineExam {
    pub client_id: Uuid,
    pub title: String,
    pub code: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub synced: bool,
}

/// 离线设备上传的同步批次
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatch {
    #[serde(default)]
    pub results: Vec<OfflineResult>,
    #[serde(default)]
    pub exams: Vec<OfflineExam>,
}

impl SyncBatch {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.exams.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len() + self.exams.len()
    }
}

/// 上传合并结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReceipt {
    /// 新合并的记录数
    pub merged: usize,
    /// 服务端已存在（重复上传）的记录数
    pub already_merged: usize,
    /// 客户端已标记 synced 而跳过的记录数
    pub skipped: usize,
    /// 已被服务端接收（新合并或重复）的 client_id，设备据此标记 synced
    pub accepted_client_ids: Vec<Uuid>,
    /// 合并后的服务端版本号
    pub revision: i64,
}

/// 下发给离线设备缓存的考试
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSnapshot {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub duration_minutes: Option<u32>,
    pub revision: i64,
}

/// 下发给离线设备缓存的学生
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSnapshot {
    pub id: i64,
    pub roll_number: String,
    pub admission_no: String,
    pub full_name: String,
    pub revision: i64,
}

/// 已删除学生的墓碑，设备据此清除本地缓存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedStudent {
    pub id: i64,
    pub roll_number: String,
    pub revision: i64,
}

/// 下载结果：自 `since` 之后变更的记录 + 当前版本号
///
/// 设备在下次下载时回传 `revision`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSnapshot {
    pub revision: i64,
    pub exams: Vec<ExamSnapshot>,
    pub students: Vec<StudentSnapshot>,
    #[serde(default)]
    pub deleted_students: Vec<DeletedStudent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_parses_camel_case_with_missing_sections() {
        let json = r#"{
            "results": [{
                "clientId": "6f1c1f5e-8d2a-4c3e-9a57-1b2f6a9d0c11",
                "examCode": "MTH101",
                "studentRollNumber": "adx-2025-001",
                "score": 72.5,
                "capturedAt": "2025-03-01T09:30:00Z"
            }]
        }"#;

        let batch: SyncBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.exams.is_empty());
        assert!(!batch.results[0].synced);
        assert!(batch.results[0].answers.is_null());
    }
}
