use serde::{Deserialize, Serialize};

/// 学生注册请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    /// 学校提供的学号（如 ECNS/AD/2024/001）
    pub admission_no: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: i64,
    #[serde(default)]
    pub department_id: Option<i64>,
}

/// 已入库的学生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    /// 系统分配的顺序学号，如 adx-2025-001
    pub roll_number: String,
    pub admission_no: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: i64,
    pub department_id: Option<i64>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
