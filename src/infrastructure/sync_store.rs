//! 服务端同步存储 - 基础设施层
//!
//! 考试与成绩以设备生成的 client_id 去重；考试和学生写入、学生删除时递增全局版本号供下载使用。

use rusqlite::params;

use crate::error::{AppResult, StorageError};
use crate::infrastructure::database::{bump_revision, current_revision, is_unique_violation, Database};
use crate::models::sync::{DeletedStudent, DownloadSnapshot, ExamSnapshot, OfflineExam, OfflineResult, StudentSnapshot};
use crate::services::sync_reconciler::{MergeOutcome, SyncStore};

/// 服务端考试/成绩存储
#[derive(Clone)]
pub struct ServerSyncStore {
    db: Database,
}

impl ServerSyncStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 服务端直接发布考试（非设备上传）
    ///
    /// # 返回
    /// 返回考试 id
    pub async fn publish_exam(&self, title: &str, code: &str, duration_minutes: Option<u32>) -> AppResult<i64> {
        let (title, code) = (title.to_string(), code.to_string());
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let revision = bump_revision(&tx)?;
                tx.execute(
                    "INSERT INTO exams(client_id, title, code, duration_minutes, revision)
                     VALUES (NULL, ?1, ?2, ?3, ?4)",
                    params![title, code, duration_minutes, revision],
                )?;
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(id)
            })
            .await
    }

    /// 某场考试已合并的成绩数
    pub async fn result_count(&self, exam_code: &str) -> AppResult<usize> {
        let exam_code = exam_code.to_string();
        self.db
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM results WHERE exam_code = ?1",
                    [&exam_code],
                    |r| r.get(0),
                )?;
                Ok(count as usize)
            })
            .await
    }
}

impl SyncStore for ServerSyncStore {
    async fn merge_exam(&self, exam: &OfflineExam) -> AppResult<MergeOutcome> {
        let exam = exam.clone();
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let revision = bump_revision(&tx)?;
                let inserted = tx.execute(
                    "INSERT INTO exams(client_id, title, code, duration_minutes, revision)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        exam.client_id.to_string(),
                        exam.title,
                        exam.code,
                        exam.duration_minutes,
                        revision
                    ],
                );
                match inserted {
                    Ok(_) => {
                        tx.commit()?;
                        Ok(MergeOutcome::Merged)
                    }
                    // 回滚，版本号不变
                    Err(e) if is_unique_violation(&e) => Ok(MergeOutcome::AlreadyMerged),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    async fn merge_result(&self, result: &OfflineResult) -> AppResult<MergeOutcome> {
        let result = result.clone();
        let answers = serde_json::to_string(&result.answers).map_err(StorageError::CorruptJson)?;
        self.db
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO results(
                        client_id, exam_code, student_roll_number, score, answers, captured_at, merged_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        result.client_id.to_string(),
                        result.exam_code,
                        result.student_roll_number,
                        result.score,
                        answers,
                        result.captured_at.to_rfc3339(),
                        chrono::Utc::now().to_rfc3339(),
                    ],
                );
                match inserted {
                    Ok(_) => Ok(MergeOutcome::Merged),
                    Err(e) if is_unique_violation(&e) => Ok(MergeOutcome::AlreadyMerged),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    async fn current_revision(&self) -> AppResult<i64> {
        self.db.call(|conn| Ok(current_revision(conn)?)).await
    }

    async fn changes_since(&self, since: i64) -> AppResult<DownloadSnapshot> {
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let revision = current_revision(&tx)?;

                let mut stmt = tx.prepare(
                    "SELECT id, title, code, duration_minutes, revision
                     FROM exams WHERE revision > ?1 ORDER BY revision",
                )?;
                let exams = stmt
                    .query_map([since], |r| {
                        Ok(ExamSnapshot {
                            id: r.get(0)?,
                            title: r.get(1)?,
                            code: r.get(2)?,
                            duration_minutes: r.get(3)?,
                            revision: r.get(4)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                drop(stmt);

                let mut stmt = tx.prepare(
                    "SELECT id, roll_number, admission_no, first_name, last_name, revision
                     FROM students WHERE revision > ?1 ORDER BY revision",
                )?;
                let students = stmt
                    .query_map([since], |r| {
                        let first: String = r.get(3)?;
                        let last: String = r.get(4)?;
                        Ok(StudentSnapshot {
                            id: r.get(0)?,
                            roll_number: r.get(1)?,
                            admission_no: r.get(2)?,
                            full_name: format!("{} {}", first, last),
                            revision: r.get(5)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                drop(stmt);

                let mut stmt = tx.prepare(
                    "SELECT student_id, roll_number, revision
                     FROM deleted_students WHERE revision > ?1 ORDER BY revision",
                )?;
                let deleted_students = stmt
                    .query_map([since], |r| {
                        Ok(DeletedStudent {
                            id: r.get(0)?,
                            roll_number: r.get(1)?,
                            revision: r.get(2)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                drop(stmt);
                tx.commit()?;

                Ok(DownloadSnapshot {
                    revision,
                    exams,
                    students,
                    deleted_students,
                })
            })
            .await
    }
}
