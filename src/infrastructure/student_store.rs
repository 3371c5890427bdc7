//! 学生与院系存储 - 基础设施层
//!
//! 实现编号分配所需的 `IdentifierStore`：最大序号读取 + 带唯一约束的写入。
//! 序号高水位记录在 `serial_counters` 中，与学生写入同一事务更新，删除学生后序号也不会复用。

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::{AppError, AppResult, StorageError};
use crate::infrastructure::database::{bump_revision, is_unique_violation, violates_column, Database};
use crate::models::identifier::SequentialIdentifier;
use crate::models::student::{NewStudent, Student};
use crate::services::admission_format::AdmissionFormat;
use crate::services::identifier_allocator::{IdentifierStore, InsertOutcome};

/// 学生与院系的持久化
#[derive(Clone)]
pub struct StudentStore {
    db: Database,
}

impl StudentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn find_by_roll_number(&self, roll_number: &str) -> AppResult<Option<Student>> {
        let roll_number = roll_number.to_string();
        self.db
            .call(move |conn| {
                let student = conn
                    .query_row(
                        "SELECT id, roll_number, admission_no, first_name, last_name, email,
                                school_id, department_id
                         FROM students WHERE roll_number = ?1",
                        [&roll_number],
                        |r| {
                            Ok(Student {
                                id: r.get(0)?,
                                roll_number: r.get(1)?,
                                admission_no: r.get(2)?,
                                first_name: r.get(3)?,
                                last_name: r.get(4)?,
                                email: r.get(5)?,
                                school_id: r.get(6)?,
                                department_id: r.get(7)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(student)
            })
            .await
    }

    /// 删除学生（序号高水位保持不变）
    ///
    /// 同一事务内递增版本号并留下墓碑，`download` 会把删除下发给设备
    pub async fn delete(&self, student_id: i64) -> AppResult<()> {
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let roll_number: Option<String> = tx
                    .query_row(
                        "SELECT roll_number FROM students WHERE id = ?1",
                        [student_id],
                        |r| r.get(0),
                    )
                    .optional()?;
                let Some(roll_number) = roll_number else {
                    return Err(AppError::Storage(StorageError::NotFound(format!(
                        "学生 {}",
                        student_id
                    ))));
                };

                let revision = bump_revision(&tx)?;
                tx.execute("DELETE FROM students WHERE id = ?1", [student_id])?;
                tx.execute(
                    "INSERT OR REPLACE INTO deleted_students(student_id, roll_number, revision)
                     VALUES (?1, ?2, ?3)",
                    params![student_id, roll_number, revision],
                )?;
                tx.commit()?;

                debug!("学生 {} 已删除，版本号 {}", roll_number, revision);
                Ok(())
            })
            .await
    }

    /// 创建院系，返回 id
    pub async fn create_department(&self, name: &str) -> AppResult<i64> {
        let name = name.trim().to_string();
        self.db
            .call(move |conn| {
                let inserted = conn.execute("INSERT INTO departments(name) VALUES (?1)", [&name]);
                match inserted {
                    Ok(_) => Ok(conn.last_insert_rowid()),
                    Err(e) if is_unique_violation(&e) => {
                        Err(AppError::uniqueness_conflict("departments.name", name))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    /// 用格式预览设置院系的学号格式
    ///
    /// # 返回
    /// 返回由预览推导出的格式
    pub async fn set_admission_format(&self, department_id: i64, preview: &str) -> AppResult<AdmissionFormat> {
        let format = AdmissionFormat::from_preview(preview)?;
        let stored = format.preview().to_string();
        self.db
            .call(move |conn| {
                let updated = conn.execute(
                    "UPDATE departments SET admission_format = ?1 WHERE id = ?2",
                    params![stored, department_id],
                )?;
                if updated == 0 {
                    return Err(AppError::Storage(StorageError::NotFound(format!(
                        "院系 {}",
                        department_id
                    ))));
                }
                Ok(())
            })
            .await?;
        Ok(format)
    }

    /// 院系的学号格式，未设置时为 None
    pub async fn admission_format(&self, department_id: i64) -> AppResult<Option<AdmissionFormat>> {
        let preview: Option<Option<String>> = self
            .db
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT admission_format FROM departments WHERE id = ?1",
                        [department_id],
                        |r| r.get(0),
                    )
                    .optional()?)
            })
            .await?;

        match preview {
            None => Err(AppError::Storage(StorageError::NotFound(format!(
                "院系 {}",
                department_id
            )))),
            Some(None) => Ok(None),
            Some(Some(preview)) => Ok(Some(AdmissionFormat::from_preview(&preview)?)),
        }
    }
}

impl IdentifierStore for StudentStore {
    type Record = NewStudent;
    type Saved = Student;

    async fn max_serial(&self, prefix: &str, period: &str) -> AppResult<u64> {
        let (prefix, period) = (prefix.to_string(), period.to_string());
        self.db
            .call(move |conn| {
                let max: Option<i64> = conn.query_row(
                    "SELECT MAX(serial) FROM (
                        SELECT last_serial AS serial FROM serial_counters
                            WHERE prefix = ?1 AND period = ?2
                        UNION ALL
                        SELECT roll_serial FROM students
                            WHERE roll_prefix = ?1 AND roll_period = ?2
                     )",
                    params![prefix, period],
                    |r| r.get(0),
                )?;
                Ok(max.unwrap_or(0).max(0) as u64)
            })
            .await
    }

    async fn insert_with_identifier(
        &self,
        record: &NewStudent,
        identifier: &SequentialIdentifier,
    ) -> AppResult<InsertOutcome<Student>> {
        let record = record.clone();
        let identifier = identifier.clone();
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let revision = bump_revision(&tx)?;
                let roll_number = identifier.to_string();
                let roll_serial = identifier.is_sequential().then_some(identifier.serial as i64);

                let inserted = tx.execute(
                    "INSERT INTO students(
                        roll_number, roll_prefix, roll_period, roll_serial,
                        admission_no, first_name, last_name, email,
                        school_id, department_id, revision, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        roll_number,
                        identifier.prefix,
                        identifier.period,
                        roll_serial,
                        record.admission_no.trim(),
                        record.first_name.trim(),
                        record.last_name.trim(),
                        record.email.trim(),
                        record.school_id,
                        record.department_id,
                        revision,
                        chrono::Utc::now().to_rfc3339(),
                    ],
                );

                match inserted {
                    Ok(_) => {}
                    Err(e) if violates_column(&e, "students.admission_no") => {
                        return Err(AppError::uniqueness_conflict("admission_no", record.admission_no));
                    }
                    Err(e) if is_unique_violation(&e) => {
                        debug!("编号 {} 唯一约束冲突", roll_number);
                        return Ok(InsertOutcome::Conflict);
                    }
                    Err(e) => return Err(e.into()),
                }
                let id = tx.last_insert_rowid();

                if let Some(serial) = roll_serial {
                    tx.execute(
                        "INSERT INTO serial_counters(prefix, period, last_serial) VALUES (?1, ?2, ?3)
                         ON CONFLICT(prefix, period)
                         DO UPDATE SET last_serial = MAX(last_serial, excluded.last_serial)",
                        params![identifier.prefix, identifier.period, serial],
                    )?;
                }
                tx.commit()?;

                Ok(InsertOutcome::Inserted(Student {
                    id,
                    roll_number,
                    admission_no: record.admission_no.trim().to_string(),
                    first_name: record.first_name.trim().to_string(),
                    last_name: record.last_name.trim().to_string(),
                    email: record.email.trim().to_string(),
                    school_id: record.school_id,
                    department_id: record.department_id,
                }))
            })
            .await
    }
}
