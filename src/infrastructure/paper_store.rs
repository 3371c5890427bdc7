//! 试卷与客观题存储 - 基础设施层

use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, StorageError};
use crate::infrastructure::database::Database;
use crate::models::question::{OptionLetter, ParsedQuestion};

/// 试卷与客观题的持久化
#[derive(Clone)]
pub struct PaperStore {
    db: Database,
}

impl PaperStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 按标题查找试卷，不存在时创建
    ///
    /// # 返回
    /// 返回试卷 id
    pub async fn ensure_paper(&self, title: &str) -> AppResult<i64> {
        let title = title.trim().to_string();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO exam_papers(title, created_at) VALUES (?1, ?2)",
                    params![title, chrono::Utc::now().to_rfc3339()],
                )?;
                let id = conn.query_row(
                    "SELECT id FROM exam_papers WHERE title = ?1",
                    [&title],
                    |r| r.get(0),
                )?;
                Ok(id)
            })
            .await
    }

    /// 批量追加客观题
    ///
    /// 序号接在试卷现有最大序号之后；单行写入失败只记录警告并跳过，不回滚其他行。
    ///
    /// # 参数
    /// - `paper_id`: 试卷 id
    /// - `questions`: 解析出的题目（按文档顺序）
    /// - `marks`: 每题分值
    ///
    /// # 返回
    /// 返回成功写入的题目数
    pub async fn append_questions(
        &self,
        paper_id: i64,
        questions: &[ParsedQuestion],
        marks: u32,
    ) -> AppResult<usize> {
        let questions = questions.to_vec();
        self.db
            .call(move |conn| {
                let exists = conn
                    .query_row("SELECT 1 FROM exam_papers WHERE id = ?1", [paper_id], |_| Ok(()))
                    .optional()?;
                if exists.is_none() {
                    return Err(AppError::Storage(StorageError::NotFound(format!(
                        "试卷 {}",
                        paper_id
                    ))));
                }

                let tx = conn.transaction()?;
                let mut position: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(position), 0) FROM objective_questions WHERE paper_id = ?1",
                    [paper_id],
                    |r| r.get(0),
                )?;

                let mut inserted = 0;
                for question in &questions {
                    let correct = question.correct.map(|c| c.as_char().to_string());
                    let result = tx.execute(
                        "INSERT INTO objective_questions(
                            paper_id, position, text,
                            option_a, option_b, option_c, option_d, option_e,
                            correct_option, marks
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                        params![
                            paper_id,
                            position + 1,
                            question.text,
                            question.option(OptionLetter::A),
                            question.option(OptionLetter::B),
                            question.option(OptionLetter::C),
                            question.option(OptionLetter::D),
                            question.option(OptionLetter::E),
                            correct,
                            marks,
                        ],
                    );

                    match result {
                        Ok(_) => {
                            position += 1;
                            inserted += 1;
                        }
                        Err(e) => warn!("⚠️ 题目写入失败，已跳过 (试卷 {}): {}", paper_id, e),
                    }
                }
                tx.commit()?;

                debug!("试卷 {} 写入 {}/{} 道题目", paper_id, inserted, questions.len());
                Ok(inserted)
            })
            .await
    }

    /// 按序号读取试卷的全部客观题
    pub async fn questions_for_paper(&self, paper_id: i64) -> AppResult<Vec<ParsedQuestion>> {
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT text, option_a, option_b, option_c, option_d, option_e, correct_option
                     FROM objective_questions WHERE paper_id = ?1 ORDER BY position",
                )?;
                let rows = stmt.query_map([paper_id], |r| {
                    let mut question = ParsedQuestion::new(r.get::<_, String>(0)?);
                    for (i, letter) in OptionLetter::ALL.iter().enumerate() {
                        question.set_option(*letter, r.get::<_, String>(i + 1)?);
                    }
                    question.correct = r
                        .get::<_, Option<String>>(6)?
                        .and_then(|c| c.chars().next())
                        .and_then(OptionLetter::from_char);
                    Ok(question)
                })?;

                let mut questions = Vec::new();
                for row in rows {
                    questions.push(row?);
                }
                Ok(questions)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, a: &str, correct: Option<OptionLetter>) -> ParsedQuestion {
        let mut q = ParsedQuestion::new(text);
        q.set_option(OptionLetter::A, a);
        q.correct = correct;
        q
    }

    #[tokio::test]
    async fn ensure_paper_is_idempotent_by_title() {
        let store = PaperStore::new(Database::open_in_memory().unwrap());
        let first = store.ensure_paper("Biology").await.unwrap();
        let again = store.ensure_paper(" Biology ").await.unwrap();
        let other = store.ensure_paper("Chemistry").await.unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn append_continues_positions_and_keeps_empty_answer_null() {
        let store = PaperStore::new(Database::open_in_memory().unwrap());
        let paper = store.ensure_paper("Physics").await.unwrap();

        let first = vec![question("Q1", "x", Some(OptionLetter::A))];
        let second = vec![question("Q2", "y", None), question("Q3", "z", Some(OptionLetter::C))];
        assert_eq!(store.append_questions(paper, &first, 1).await.unwrap(), 1);
        assert_eq!(store.append_questions(paper, &second, 2).await.unwrap(), 2);

        let stored = store.questions_for_paper(paper).await.unwrap();
        let texts: Vec<_> = stored.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["Q1", "Q2", "Q3"]);
        assert_eq!(stored[1].correct, None);
        assert_eq!(stored[1].option(OptionLetter::B), "");
    }

    #[tokio::test]
    async fn unknown_paper_is_not_found() {
        let store = PaperStore::new(Database::open_in_memory().unwrap());
        let err = store
            .append_questions(404, &[question("Q", "a", None)], 1)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }
}
