//! 离线设备存储 - 业务能力层
//!
//! 设备断网时在本地保存考试和成绩，联网后打包成 `SyncBatch` 上传，
//! 再根据服务端回执标记已同步。

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult, StorageError};
use crate::infrastructure::database::Database;
use crate::models::sync::{OfflineExam, OfflineResult, SyncBatch};

/// 设备端离线存储
#[derive(Clone)]
pub struct OfflineStore {
    db: Database,
}

impl OfflineStore {
    /// 在给定数据库上建立设备端表
    pub async fn open(db: Database) -> AppResult<Self> {
        db.call(|conn| Ok(init_device_schema(conn)?)).await?;
        Ok(Self { db })
    }

    /// 离线创建考试
    pub async fn create_exam(
        &self,
        title: &str,
        code: &str,
        duration_minutes: Option<u32>,
    ) -> AppResult<OfflineExam> {
        let exam = OfflineExam {
            client_id: Uuid::new_v4(),
            title: title.trim().to_string(),
            code: code.trim().to_string(),
            duration_minutes,
            synced: false,
        };

        let row = exam.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO offline_exams(client_id, title, code, duration_minutes, synced)
                     VALUES (?1, ?2, ?3, ?4, 0)",
                    params![row.client_id.to_string(), row.title, row.code, row.duration_minutes],
                )?;
                Ok(())
            })
            .await?;

        debug!("离线考试已保存: {} ({})", exam.code, exam.client_id);
        Ok(exam)
    }

    /// 离线保存成绩
    pub async fn save_result(
        &self,
        exam_code: &str,
        student_roll_number: &str,
        score: f64,
        answers: serde_json::Value,
    ) -> AppResult<OfflineResult> {
        let result = OfflineResult {
            client_id: Uuid::new_v4(),
            exam_code: exam_code.to_string(),
            student_roll_number: student_roll_number.to_string(),
            score,
            answers,
            captured_at: Utc::now(),
            synced: false,
        };

        let row = result.clone();
        let answers = serde_json::to_string(&row.answers).map_err(StorageError::CorruptJson)?;
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO offline_results(
                        client_id, exam_code, student_roll_number, score, answers, captured_at, synced
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                    params![
                        row.client_id.to_string(),
                        row.exam_code,
                        row.student_roll_number,
                        row.score,
                        answers,
                        row.captured_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;

        debug!("离线成绩已保存: {} / {}", result.exam_code, result.student_roll_number);
        Ok(result)
    }

    /// 尚未同步的成绩，按采集时间排序
    pub async fn unsynced_results(&self) -> AppResult<Vec<OfflineResult>> {
        self.db.call(|conn| unsynced_results(conn)).await
    }

    /// 打包全部未同步的考试和成绩
    pub async fn pending_batch(&self) -> AppResult<SyncBatch> {
        self.db
            .call(|conn| {
                Ok(SyncBatch {
                    exams: unsynced_exams(conn)?,
                    results: unsynced_results(conn)?,
                })
            })
            .await
    }

    /// 标记已被服务端接收的记录
    ///
    /// # 返回
    /// 返回实际更新的记录数
    pub async fn mark_synced(&self, client_ids: &[Uuid]) -> AppResult<usize> {
        let ids: Vec<String> = client_ids.iter().map(Uuid::to_string).collect();
        let updated = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut updated = 0;
                for id in &ids {
                    updated += tx.execute(
                        "UPDATE offline_results SET synced = 1 WHERE client_id = ?1 AND synced = 0",
                        [id],
                    )?;
                    updated += tx.execute(
                        "UPDATE offline_exams SET synced = 1 WHERE client_id = ?1 AND synced = 0",
                        [id],
                    )?;
                }
                tx.commit()?;
                Ok(updated)
            })
            .await?;

        info!("✓ 已标记 {} 条离线记录为已同步", updated);
        Ok(updated)
    }
}

fn init_device_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS offline_exams(
            client_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            code TEXT NOT NULL,
            duration_minutes INTEGER,
            synced INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS offline_results(
            client_id TEXT PRIMARY KEY,
            exam_code TEXT NOT NULL,
            student_roll_number TEXT NOT NULL,
            score REAL NOT NULL,
            answers TEXT NOT NULL,
            captured_at TEXT NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;
    Ok(())
}

fn unsynced_exams(conn: &Connection) -> AppResult<Vec<OfflineExam>> {
    let mut stmt = conn.prepare(
        "SELECT client_id, title, code, duration_minutes FROM offline_exams
         WHERE synced = 0 ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<u32>>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(client_id, title, code, duration_minutes)| {
            Ok(OfflineExam {
                client_id: parse_client_id(&client_id)?,
                title,
                code,
                duration_minutes,
                synced: false,
            })
        })
        .collect()
}

fn unsynced_results(conn: &Connection) -> AppResult<Vec<OfflineResult>> {
    let mut stmt = conn.prepare(
        "SELECT client_id, exam_code, student_roll_number, score, answers, captured_at
         FROM offline_results WHERE synced = 0 ORDER BY captured_at, rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, f64>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(client_id, exam_code, student_roll_number, score, answers, captured_at)| {
            Ok(OfflineResult {
                client_id: parse_client_id(&client_id)?,
                exam_code,
                student_roll_number,
                score,
                answers: serde_json::from_str(&answers).map_err(StorageError::CorruptJson)?,
                captured_at: DateTime::parse_from_rfc3339(&captured_at)
                    .map_err(|e| AppError::Other(format!("无效的采集时间 {}: {}", captured_at, e)))?
                    .with_timezone(&Utc),
                synced: false,
            })
        })
        .collect()
}

fn parse_client_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::Other(format!("无效的 client_id {}: {}", raw, e)))
}
