//! 评分流程 - 流程层
//!
//! 核心职责：定义"一个 (作文, 维度) 组合"的完整处理流程
//!
//! 流程顺序：
//! 1. 构建提示词
//! 2. 调用 LLM（单次超时 + 指数退避重试）
//! 3. 解析回复并校验分数范围

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, LlmError};
use crate::models::evaluation::Evaluation;
use crate::models::loaders::PromptTemplates;
use crate::models::rubric::RubricTable;
use crate::services::{build_prompt, parse_reply, ChatModel, PromptRequest};
use crate::workflow::grading_ctx::GradingCtx;

/// 重试等待时间上限
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// 评分流程
///
/// - 不持有任何文件或网络资源，只依赖业务能力（services）
/// - 内部全是 `Arc`，克隆后可以交给并发任务
#[derive(Clone)]
pub struct GradingFlow {
    model: Arc<dyn ChatModel>,
    templates: Arc<PromptTemplates>,
    rubric: Arc<RubricTable>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl GradingFlow {
    /// 创建新的评分流程
    pub fn new(
        model: Arc<dyn ChatModel>,
        templates: Arc<PromptTemplates>,
        rubric: Arc<RubricTable>,
        config: &Config,
    ) -> Self {
        Self {
            model,
            templates,
            rubric,
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms).min(MAX_BACKOFF),
        }
    }

    pub async fn run(&self, essay_text: &str, ctx: &GradingCtx) -> AppResult<Evaluation> {
        let criterion = ctx.criterion;

        let request = build_prompt(
            criterion,
            self.templates.get(criterion),
            self.rubric.bands(criterion),
            essay_text,
        )?;

        let reply = self.call_with_retry(&request, ctx).await?;
        debug!("{} 模型回复: {}", ctx, crate::utils::truncate_text(&reply, 120));

        let evaluation = parse_reply(&reply, criterion, &self.rubric)?;
        info!("{} ✓ 得分 {}", ctx, evaluation.score);

        Ok(evaluation)
    }

    /// 调用 LLM，超时或失败时按指数退避重试
    async fn call_with_retry(
        &self,
        request: &PromptRequest,
        ctx: &GradingCtx,
    ) -> Result<String, LlmError> {
        let mut attempt = 0;
        let mut backoff = self.backoff;

        loop {
            attempt += 1;
            debug!("{} 第 {} 次调用 LLM", ctx, attempt);

            let result = match tokio::time::timeout(self.timeout, self.model.complete(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout {
                    model: self.model.model_name().to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }),
            };

            match result {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    warn!(
                        "{} ⚠️ {}，{} 毫秒后重试 ({}/{})",
                        ctx,
                        e,
                        backoff.as_millis(),
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ParseError};
    use crate::models::criterion::Criterion;
    use crate::models::rubric::tests::enem_table;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 前 `failures` 次返回错误，之后返回固定回复
    struct FlakyModel {
        failures: usize,
        calls: AtomicUsize,
        reply: String,
    }

    #[async_trait]
    impl ChatModel for FlakyModel {
        fn model_name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, _request: &PromptRequest) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(LlmError::RateLimited {
                    model: "flaky".to_string(),
                    message: "429".to_string(),
                })
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    /// 永远不返回
    struct HangingModel;

    #[async_trait]
    impl ChatModel for HangingModel {
        fn model_name(&self) -> &str {
            "hanging"
        }

        async fn complete(&self, _request: &PromptRequest) -> Result<String, LlmError> {
            std::future::pending().await
        }
    }

    fn templates() -> Arc<PromptTemplates> {
        let map: BTreeMap<Criterion, String> = Criterion::ALL
            .into_iter()
            .map(|c| (c, format!("Avalie {}.\n{{rubrica}}", c.key())))
            .collect();
        Arc::new(PromptTemplates::new(map).unwrap())
    }

    fn flow(model: Arc<dyn ChatModel>, max_retries: u32) -> GradingFlow {
        let config = Config {
            request_timeout_secs: 5,
            max_retries,
            retry_backoff_ms: 10,
            ..Config::default()
        };
        GradingFlow::new(model, templates(), Arc::new(enem_table()), &config)
    }

    fn ctx() -> GradingCtx {
        GradingCtx::new("essay1", 1, Criterion::Theme)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let model = Arc::new(FlakyModel {
            failures: 2,
            calls: AtomicUsize::new(0),
            reply: r#"{"score": 160, "description": "Desenvolvimento regular"}"#.to_string(),
        });
        let evaluation = flow(model.clone(), 2).run("Texto", &ctx()).await.unwrap();

        assert_eq!(evaluation.score, 160);
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let model = Arc::new(FlakyModel {
            failures: 10,
            calls: AtomicUsize::new(0),
            reply: String::new(),
        });
        let err = flow(model.clone(), 1).run("Texto", &ctx()).await.unwrap_err();

        assert!(matches!(err, AppError::Llm(LlmError::RateLimited { .. })));
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_capped_even_when_configured_huge() {
        let model = Arc::new(FlakyModel {
            failures: 3,
            calls: AtomicUsize::new(0),
            reply: r#"{"score": 80, "description": "Regular"}"#.to_string(),
        });
        let config = Config {
            request_timeout_secs: 5,
            max_retries: 3,
            retry_backoff_ms: u64::MAX,
            ..Config::default()
        };
        let flow = GradingFlow::new(model.clone(), templates(), Arc::new(enem_table()), &config);
        assert_eq!(flow.backoff, MAX_BACKOFF);

        let start = tokio::time::Instant::now();
        let evaluation = flow.run("Texto", &ctx()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(evaluation.score, 80);
        assert_eq!(model.calls.load(Ordering::SeqCst), 4);
        assert!(elapsed >= MAX_BACKOFF * 3);
        assert!(elapsed < MAX_BACKOFF * 3 + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_call_failure() {
        let err = flow(Arc::new(HangingModel), 0)
            .run("Texto", &ctx())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Llm(LlmError::Timeout { timeout_secs: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_parse_error_not_retried() {
        let model = Arc::new(FlakyModel {
            failures: 0,
            calls: AtomicUsize::new(0),
            reply: "sem nota".to_string(),
        });
        let err = flow(model.clone(), 3).run("Texto", &ctx()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Parse(ParseError::UnrecognizedShape { .. })
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
