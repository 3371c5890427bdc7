//! 学生注册流程 - 流程层
//!
//! 流程顺序：
//! 1. 校验必填字段
//! 2. 院系设置了学号格式时校验学号
//! 3. 分配顺序学号并写入学生

use tracing::info;

use crate::config::Config;
use crate::error::{AppResult, ValidationError};
use crate::infrastructure::StudentStore;
use crate::models::student::{NewStudent, Student};
use crate::services::identifier_allocator::{current_period, AllocatorSettings, SequentialIdentifierAllocator};

/// 学生注册流程
pub struct EnrollmentFlow {
    allocator: SequentialIdentifierAllocator<StudentStore>,
    roll_number_prefix: String,
}

impl EnrollmentFlow {
    pub fn new(config: &Config, students: StudentStore) -> Self {
        Self {
            allocator: SequentialIdentifierAllocator::new(students, AllocatorSettings::from_config(config)),
            roll_number_prefix: config.roll_number_prefix.clone(),
        }
    }

    pub fn students(&self) -> &StudentStore {
        self.allocator.store()
    }

    /// 在当前年份注册学生
    pub async fn enroll(&self, student: &NewStudent) -> AppResult<Student> {
        self.enroll_in_period(student, &current_period()).await
    }

    /// 在指定期间注册学生
    ///
    /// # 返回
    /// 成功时返回带学号的学生；学号争用重试耗尽时返回可重试的 `AllocationError`
    pub async fn enroll_in_period(&self, student: &NewStudent, period: &str) -> AppResult<Student> {
        validate_required(student)?;

        if let Some(department_id) = student.department_id {
            if let Some(format) = self.students().admission_format(department_id).await? {
                format.validate(&student.admission_no)?;
            }
        }

        let (roll_number, saved) = self
            .allocator
            .allocate(&self.roll_number_prefix, period, student)
            .await?;

        info!("✅ 学生 {} 注册成功，学号 {}", saved.full_name(), roll_number);
        Ok(saved)
    }
}

fn validate_required(student: &NewStudent) -> Result<(), ValidationError> {
    let fields = [
        ("admissionNo", &student.admission_no),
        ("firstName", &student.first_name),
        ("lastName", &student.last_name),
        ("email", &student.email),
    ];
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ValidationError::MissingField(*name)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::Database;
    use crate::services::IdentifierStore;

    fn flow() -> EnrollmentFlow {
        let store = StudentStore::new(Database::open_in_memory().unwrap());
        EnrollmentFlow::new(&Config::default(), store)
    }

    fn new_student(admission_no: &str) -> NewStudent {
        NewStudent {
            admission_no: admission_no.to_string(),
            first_name: "Chidi".to_string(),
            last_name: "Okafor".to_string(),
            email: "chidi@example.com".to_string(),
            school_id: 1,
            department_id: None,
        }
    }

    #[tokio::test]
    async fn assigns_dense_roll_numbers_per_period() {
        let flow = flow();
        let a = flow.enroll_in_period(&new_student("A1"), "2025").await.unwrap();
        let b = flow.enroll_in_period(&new_student("A2"), "2025").await.unwrap();
        let c = flow.enroll_in_period(&new_student("A3"), "2026").await.unwrap();
        assert_eq!(a.roll_number, "adx-2025-001");
        assert_eq!(b.roll_number, "adx-2025-002");
        assert_eq!(c.roll_number, "adx-2026-001");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_allocation() {
        let flow = flow();
        let mut student = new_student("A1");
        student.email = "  ".to_string();
        let err = flow.enroll_in_period(&student, "2025").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::MissingField("email"))));
        assert_eq!(flow.students().max_serial("adx", "2025").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn department_format_is_enforced() {
        let flow = flow();
        let dept = flow.students().create_department("Economics").await.unwrap();
        flow.students()
            .set_admission_format(dept, "ECNS/AD/2024/001")
            .await
            .unwrap();

        let mut bad = new_student("12345");
        bad.department_id = Some(dept);
        let err = flow.enroll_in_period(&bad, "2025").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::AdmissionFormatMismatch { .. })
        ));

        let mut good = new_student("ECNS/AD/2025/001");
        good.department_id = Some(dept);
        let student = flow.enroll_in_period(&good, "2025").await.unwrap();
        assert_eq!(student.department_id, Some(dept));
    }
}
