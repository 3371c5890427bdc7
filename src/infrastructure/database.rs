//! SQLite 连接 - 基础设施层
//!
//! 整个程序只有这里持有数据库连接，所有读写都经由 `Database::call`
//! 放到阻塞线程池中执行。

use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, StorageError};

/// 数据库句柄，可廉价克隆并在任务间共享
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// 打开（或创建）数据库文件并建表
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("📂 打开数据库: {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// 内存数据库，用于测试
    pub fn open_in_memory() -> AppResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 在阻塞线程池中使用连接
    ///
    /// # 参数
    /// - `f`: 拿到独占连接后执行的操作
    ///
    /// # 返回
    /// 返回 `f` 的结果
    pub async fn call<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| AppError::Storage(StorageError::Task("数据库连接锁已失效".to_string())))?;
            f(&mut guard)
        })
        .await?
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sync_state(
            id INTEGER PRIMARY KEY CHECK (id = 1),
            revision INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO sync_state(id, revision) VALUES (1, 0)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exam_papers(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS objective_questions(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            paper_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            option_a TEXT NOT NULL,
            option_b TEXT NOT NULL,
            option_c TEXT NOT NULL,
            option_d TEXT NOT NULL,
            option_e TEXT NOT NULL,
            correct_option TEXT,
            marks INTEGER NOT NULL DEFAULT 1,
            UNIQUE(paper_id, position),
            FOREIGN KEY(paper_id) REFERENCES exam_papers(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS departments(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            admission_format TEXT
        )",
        [],
    )?;

    // roll_serial 为 NULL 表示时间戳编号，不参与唯一序号约束
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roll_number TEXT NOT NULL UNIQUE,
            roll_prefix TEXT NOT NULL,
            roll_period TEXT NOT NULL,
            roll_serial INTEGER,
            admission_no TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            school_id INTEGER NOT NULL,
            department_id INTEGER,
            revision INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(roll_prefix, roll_period, roll_serial),
            FOREIGN KEY(department_id) REFERENCES departments(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS deleted_students(
            student_id INTEGER PRIMARY KEY,
            roll_number TEXT NOT NULL,
            revision INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS serial_counters(
            prefix TEXT NOT NULL,
            period TEXT NOT NULL,
            last_serial INTEGER NOT NULL,
            PRIMARY KEY(prefix, period)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exams(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id TEXT UNIQUE,
            title TEXT NOT NULL,
            code TEXT NOT NULL,
            duration_minutes INTEGER,
            revision INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS results(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id TEXT NOT NULL UNIQUE,
            exam_code TEXT NOT NULL,
            student_roll_number TEXT NOT NULL,
            score REAL NOT NULL,
            answers TEXT NOT NULL,
            captured_at TEXT NOT NULL,
            merged_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_exam ON results(exam_code)",
        [],
    )?;

    debug!("数据库表结构已就绪");
    Ok(())
}

/// 在事务中递增全局版本号，返回新版本号
pub(crate) fn bump_revision(tx: &Transaction<'_>) -> rusqlite::Result<i64> {
    tx.execute("UPDATE sync_state SET revision = revision + 1 WHERE id = 1", [])?;
    tx.query_row("SELECT revision FROM sync_state WHERE id = 1", [], |r| r.get(0))
}

/// 当前全局版本号
pub(crate) fn current_revision(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT revision FROM sync_state WHERE id = 1", [], |r| r.get(0))
}

/// 是否为唯一约束（含主键）冲突
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// 唯一约束冲突是否落在指定列上（如 `students.admission_no`）
pub(crate) fn violates_column(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            is_unique_violation(err) && message.contains(column)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_created_and_revision_starts_at_zero() {
        let db = Database::open_in_memory().unwrap();
        let revision = db.call(|conn| Ok(current_revision(conn)?)).await.unwrap();
        assert_eq!(revision, 0);
    }

    #[tokio::test]
    async fn reopening_a_file_keeps_schema_idempotent() {
        let path = std::env::temp_dir().join(format!("exam_core_{}.sqlite3", uuid::Uuid::new_v4()));
        Database::open(&path).unwrap();
        let db = Database::open(&path).unwrap();

        let bumped = db
            .call(|conn| {
                let tx = conn.transaction()?;
                let revision = bump_revision(&tx)?;
                tx.commit()?;
                Ok(revision)
            })
            .await
            .unwrap();
        assert_eq!(bumped, 1);

        drop(db);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unique_violation_is_detected_by_column() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute("INSERT INTO departments(name) VALUES ('Science')", [])
            .unwrap();
        let err = conn
            .execute("INSERT INTO departments(name) VALUES ('Science')", [])
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(violates_column(&err, "departments.name"));
        assert!(!violates_column(&err, "students.admission_no"));
    }
}
