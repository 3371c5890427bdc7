//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描导入目录，限制并发（Semaphore）
//! - 合并同步收件箱中的离线批次
//! - 输出全局统计信息
//!
//! ### `paper_processor` - 单个文档处理器
//! - 为文档建立上下文，委托 `ImportFlow`
//! - 输出单个文档的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<RawDocument> + Vec<SyncBatch>)
//!     ↓
//! paper_processor (处理单个 RawDocument)
//!     ↓
//! workflow::ImportFlow / EnrollmentFlow
//!     ↓
//! services (能力层：解析 / 编号分配 / 同步合并 / 警告)
//!     ↓
//! infrastructure (基础设施：Database 与各存储)
//! ```

pub mod batch_processor;
pub mod paper_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use paper_processor::process_paper;
