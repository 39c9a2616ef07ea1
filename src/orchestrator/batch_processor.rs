//! 批量作文处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责启动校验、批量评分和结果落盘。
//!
//! ## 核心功能
//!
//! 1. **启动校验**：API 密钥、提示词模板、评分表、作文目录，任一缺失直接失败
//! 2. **批量加载**：扫描并读取所有待评分的作文
//! 3. **并发控制**：使用 Semaphore 限制同时进行的 LLM 调用数量（默认 1，即顺序执行）
//! 4. **结果汇总**：所有组合结束后，由本模块一次性写出结果文档
//! 5. **全局统计**：汇总成功 / 失败数量，失败组合写入失败清单

use std::path::Path;
use std::sync::Arc;

use futures::future::{join_all, ready, Either};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, InputError};
use crate::models::criterion::Criterion;
use crate::models::essay::Essay;
use crate::models::evaluation::{PairOutcome, ResultDocument};
use crate::models::loaders::{load_prompt_templates, load_rubric, EssayDir};
use crate::orchestrator::essay_processor::{self, EssayResult};
use crate::services::{ChatModel, LlmService, ResultWriter, WarnWriter};
use crate::utils::logging::{log_essays_loaded, log_startup, print_final_stats};
use crate::workflow::GradingFlow;

/// 应用主结构
pub struct App {
    config: Config,
    flow: GradingFlow,
    essays: EssayDir,
    writer: ResultWriter,
    warn_writer: WarnWriter,
}

impl App {
    /// 使用真实的 LLM 服务初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let model = LlmService::new(&config)?;
        Self::with_model(config, Arc::new(model)).await
    }

    /// 使用指定的模型初始化应用
    ///
    /// 校验顺序：API 密钥 → 提示词模板 → 评分表 → 作文目录。
    /// 任一项失败都会在调用模型之前返回错误。
    pub async fn with_model(config: Config, model: Arc<dyn ChatModel>) -> AppResult<Self> {
        config.require_api_key()?;

        log_startup(&config);

        let templates = load_prompt_templates(Path::new(&config.prompt_folder)).await?;
        info!("✓ 已加载 {} 个维度的提示词", Criterion::ALL.len());

        let rubric = load_rubric(Path::new(&config.rubric_file)).await?;
        info!("✓ 已加载评分表: {}", config.rubric_file);

        let essays = EssayDir::open(&config.essay_folder)?;

        let flow = GradingFlow::new(model, Arc::new(templates), Arc::new(rubric), &config);

        Ok(Self {
            writer: ResultWriter::new(&config.output_file),
            warn_writer: WarnWriter::with_path(config.warn_file.clone()),
            config,
            flow,
            essays,
        })
    }

    /// 运行应用主逻辑
    ///
    /// 返回写入磁盘的结果文档。单个组合的失败只记录，不会中断。
    pub async fn run(&self) -> AppResult<ResultDocument> {
        if let Err(e) = self.warn_writer.init().await {
            warn!("⚠️ 无法初始化失败清单 {}: {}", self.warn_writer.path(), e);
        }

        info!("\n📁 正在扫描作文目录: {}", self.essays.path().display());
        let entries = self.essays.load_all().await?;

        if entries.is_empty() {
            warn!("⚠️ 没有找到待评分的作文");
        }
        log_essays_loaded(entries.len(), Criterion::ALL.len());

        let results = self.grade_all(entries).await?;

        let mut document = ResultDocument::new();
        for result in results {
            document.register_essay(&result.essay_id);
            for (criterion, outcome) in result.outcomes {
                if let PairOutcome::Failed(message) = &outcome {
                    self.record_failure(&result.essay_id, criterion, message).await;
                }
                document.record(&result.essay_id, criterion, outcome);
            }
        }

        self.writer.write(&document).await?;

        print_final_stats(
            document.success_count(),
            document.failure_count(),
            self.writer.path(),
        );

        Ok(document)
    }

    /// 为所有作文评分
    async fn grade_all(
        &self,
        entries: Vec<Result<Essay, InputError>>,
    ) -> AppResult<Vec<EssayResult>> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency()));
        let mut tasks = Vec::with_capacity(entries.len());

        for (idx, entry) in entries.into_iter().enumerate() {
            let essay_index = idx + 1;
            match entry {
                Ok(essay) => tasks.push(Either::Left(
                    essay_processor::grade_essay(
                        &self.flow,
                        Arc::new(essay),
                        essay_index,
                        Arc::clone(&semaphore),
                    ),
                )),
                Err(InputError::EssayUnreadable { id, path, source }) => {
                    error!("[作文 #{}] ❌ 无法读取 {}: {}", essay_index, path, source);
                    let message = format!("无法读取作文: {}", source);
                    tasks.push(Either::Right(ready(
                        EssayResult::all_failed(id, &message),
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(join_all(tasks).await)
    }

    /// 写入失败清单，失败不影响主流程
    async fn record_failure(&self, essay_id: &str, criterion: Criterion, message: &str) {
        if let Err(e) = self
            .warn_writer
            .write(essay_id, criterion.key(), message)
            .await
        {
            warn!("⚠️ 写入失败清单出错: {}", e);
        }
    }
}
