//! 单篇作文处理器 - 编排层
//!
//! ## 职责
//!
//! 为一篇作文的五个维度各启动一个评分任务，等待全部结束后汇总。
//!
//! ## 设计特点
//!
//! - 每个 (作文, 维度) 组合只派发一次
//! - 并发数由外部传入的 Semaphore 控制
//! - 某个组合失败（包括任务 panic）不影响其他组合

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::error::LlmError;
use crate::models::criterion::Criterion;
use crate::models::essay::Essay;
use crate::models::evaluation::PairOutcome;
use crate::workflow::{GradingCtx, GradingFlow};

/// 单篇作文的评分结果
#[derive(Debug)]
pub struct EssayResult {
    pub essay_id: String,
    pub outcomes: Vec<(Criterion, PairOutcome)>,
}

impl EssayResult {
    /// 成功的维度数量
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, PairOutcome::Succeeded(_)))
            .count()
    }

    /// 所有维度都记为失败（作文无法读取时使用）
    pub fn all_failed(essay_id: impl Into<String>, message: &str) -> Self {
        Self {
            essay_id: essay_id.into(),
            outcomes: Criterion::ALL
                .into_iter()
                .map(|c| (c, PairOutcome::Failed(message.to_string())))
                .collect(),
        }
    }
}

/// 为一篇作文的五个维度评分
///
/// # 参数
/// - `flow`: 评分流程
/// - `essay`: 作文
/// - `essay_index`: 作文索引（用于日志）
/// - `semaphore`: 全局并发控制
pub async fn grade_essay(
    flow: &GradingFlow,
    essay: Arc<Essay>,
    essay_index: usize,
    semaphore: Arc<Semaphore>,
) -> EssayResult {
    info!(
        "[作文 #{}] 📝 开始评分: {} ({} 字符)",
        essay_index,
        essay.id,
        essay.text.chars().count()
    );

    let handles = Criterion::ALL.into_iter().map(|criterion| {
        let ctx = GradingCtx::new(essay.id.clone(), essay_index, criterion);
        let flow = flow.clone();
        let essay = Arc::clone(&essay);
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn({
            let ctx = ctx.clone();
            async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| LlmError::Cancelled)?;
                flow.run(&essay.text, &ctx).await
            }
        });

        async move { (ctx, handle.await) }
    });

    let mut outcomes = Vec::with_capacity(Criterion::ALL.len());

    for (ctx, joined) in join_all(handles).await {
        let outcome = match joined {
            Ok(Ok(evaluation)) => PairOutcome::Succeeded(evaluation),
            Ok(Err(e)) => {
                error!("{} ❌ 评分失败: {}", ctx, e);
                PairOutcome::Failed(e.to_string())
            }
            Err(e) => {
                error!("{} 任务执行失败: {}", ctx, e);
                PairOutcome::Failed(format!("任务执行失败: {}", e))
            }
        };
        outcomes.push((ctx.criterion, outcome));
    }

    let result = EssayResult {
        essay_id: essay.id.clone(),
        outcomes,
    };

    info!(
        "[作文 #{}] ✓ {} 完成: 成功 {}/{}",
        essay_index,
        essay.id,
        result.success_count(),
        Criterion::ALL.len()
    );

    result
}
