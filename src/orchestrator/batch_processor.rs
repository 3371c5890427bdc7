//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量导入、同步合并和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、打开数据库
//! 2. **批量导入**：扫描导入目录中的 .txt / .docx，每个文档导入一张试卷
//! 3. **并发控制**：使用 Semaphore 限制同时导入的文档数
//! 4. **同步合并**：依次合并同步收件箱中的 .json 批次
//! 5. **全局统计**：汇总导入与同步结果

use crate::config::Config;
use crate::infrastructure::{Database, PaperStore, ServerSyncStore, StudentStore};
use crate::models::{load_all_documents, load_all_sync_batches, RawDocument};
use crate::orchestrator::paper_processor;
use crate::services::SyncReconciler;
use crate::utils::logging::{
    init_log_file, log_documents_loaded, log_startup, log_sync_batch_start, print_final_stats,
    RunStats,
};
use crate::workflow::{EnrollmentFlow, ImportFlow};
use anyhow::Result;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    db: Database,
    import_flow: Arc<ImportFlow>,
    reconciler: SyncReconciler<ServerSyncStore>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(config.max_concurrent_imports, &config.database_path);

        let db = Database::open(Path::new(&config.database_path))?;
        Ok(Self::with_database(config, db))
    }

    /// 使用已打开的数据库创建应用（测试使用内存数据库）
    pub fn with_database(config: Config, db: Database) -> Self {
        let import_flow = Arc::new(ImportFlow::new(&config, PaperStore::new(db.clone())));
        let reconciler = SyncReconciler::new(ServerSyncStore::new(db.clone()));
        Self {
            config,
            db,
            import_flow,
            reconciler,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// 学生注册流程
    pub fn enrollment(&self) -> EnrollmentFlow {
        EnrollmentFlow::new(&self.config, StudentStore::new(self.db.clone()))
    }

    pub fn reconciler(&self) -> &SyncReconciler<ServerSyncStore> {
        &self.reconciler
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        // ========== 导入 ==========
        let documents = self.load_documents().await;
        if documents.is_empty() {
            warn!("⚠️ 没有找到待导入的文档");
        } else {
            stats.documents = documents.len();
            log_documents_loaded(documents.len(), self.config.max_concurrent_imports);
            self.import_all(documents, &mut stats).await?;
        }

        // ========== 同步 ==========
        self.merge_sync_inbox(&mut stats).await?;

        print_final_stats(&stats, &self.config.output_log_file);
        Ok(stats)
    }

    /// 加载导入目录，目录不存在时只记录警告
    async fn load_documents(&self) -> Vec<(PathBuf, RawDocument)> {
        info!("\n📁 正在扫描待导入的文档: {}", self.config.import_folder);
        match load_all_documents(&self.config.import_folder).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("⚠️ 无法加载导入目录: {:#}", e);
                Vec::new()
            }
        }
    }

    /// 并发导入所有文档
    async fn import_all(
        &self,
        documents: Vec<(PathBuf, RawDocument)>,
        stats: &mut RunStats,
    ) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_imports.max(1)));
        let mut handles = Vec::with_capacity(documents.len());

        for (idx, (_path, document)) in documents.into_iter().enumerate() {
            let file_index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = Arc::clone(&self.import_flow);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                paper_processor::process_paper(&flow, document, file_index).await
            });
            handles.push((file_index, handle));
        }

        // 等待所有任务完成，结果按文档顺序汇总
        let results = join_all(
            handles
                .into_iter()
                .map(|(file_index, handle)| async move { (file_index, handle.await) }),
        )
        .await;

        for (file_index, result) in results {
            match result {
                Ok(Ok(outcome)) => {
                    stats.imported += 1;
                    stats.questions += outcome.stored;
                    stats.warnings += outcome.result.warnings.len();
                }
                Ok(Err(_)) => stats.failed += 1,
                Err(e) => {
                    error!("[试卷 {}] 任务执行失败: {}", file_index, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(())
    }

    /// 依次合并同步收件箱中的批次
    async fn merge_sync_inbox(&self, stats: &mut RunStats) -> Result<()> {
        let batches = load_all_sync_batches(&self.config.sync_inbox_folder).await?;
        let total = batches.len();

        for (idx, (path, batch)) in batches.into_iter().enumerate() {
            log_sync_batch_start(idx + 1, total, &path.display().to_string(), batch.len());

            match self.reconciler.upload(&batch).await {
                Ok(receipt) => {
                    stats.merged += receipt.merged;
                    stats.already_merged += receipt.already_merged;
                    stats.skipped += receipt.skipped;
                }
                Err(e) => error!("❌ 同步批次 {} 合并失败: {}", path.display(), e),
            }
        }

        Ok(())
    }
}
