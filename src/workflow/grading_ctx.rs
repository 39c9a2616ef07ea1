//! 评分上下文
//!
//! 封装"我正在给哪篇作文的哪个维度评分"这一信息

use std::fmt::Display;

use crate::models::criterion::Criterion;

/// 评分上下文
#[derive(Debug, Clone)]
pub struct GradingCtx {
    /// 作文标识
    pub essay_id: String,

    /// 作文索引（仅用于日志显示，从1开始）
    pub essay_index: usize,

    /// 评分维度
    pub criterion: Criterion,
}

impl GradingCtx {
    pub fn new(essay_id: impl Into<String>, essay_index: usize, criterion: Criterion) -> Self {
        Self {
            essay_id: essay_id.into(),
            essay_index,
            criterion,
        }
    }
}

impl Display for GradingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[作文 #{} {} 维度 C{}]",
            self.essay_index,
            self.essay_id,
            self.criterion.number()
        )
    }
}
