//! # Exam Core
//!
//! 客观题导入、学号分配与离线同步的核心库
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（SQLite 连接），只暴露存储能力
//! - `Database` - 唯一的连接 owner，提供 call() 能力
//! - `PaperStore` / `StudentStore` / `ServerSyncStore` - 试卷题目、学生院系、同步记录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionParser` - 文本 → 行 → 分类 → 组装，输出题目和警告
//! - `SequentialIdentifierAllocator` - 乐观并发的顺序编号分配
//! - `SyncReconciler` - 离线批次的幂等合并与增量下载
//! - `OfflineStore` - 设备端离线存储
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文档"、"一个学生"的完整处理流程
//! - `ImportFlow` - 提取 → 解析 → 写入 → 警告
//! - `EnrollmentFlow` - 校验 → 学号格式 → 分配学号
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量导入与同步合并，管理并发
//! - `orchestrator/paper_processor` - 单个文档处理器
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::Database;
pub use models::question::{ImportResult, OptionLetter, ParsedQuestion};
pub use models::SequentialIdentifier;
pub use orchestrator::{process_paper, App};
pub use services::{QuestionParser, SequentialIdentifierAllocator, SyncReconciler};
pub use workflow::{EnrollmentFlow, ImportCtx, ImportFlow};
