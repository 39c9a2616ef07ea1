use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::criterion::Criterion;

/// 单个 (作文, 维度) 的评分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u32,
    pub description: String,
}

/// 结果文档中的一项
///
/// 成功时为 `{score, description}`；失败时分数和描述为 `null`，
/// 并附带 `error`，方便定位需要重跑的组合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionEntry {
    pub score: Option<u32>,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CriterionEntry {
    pub fn success(evaluation: Evaluation) -> Self {
        Self {
            score: Some(evaluation.score),
            description: Some(evaluation.description),
            error: None,
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            score: None,
            description: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.score.is_some()
    }
}

/// 单个组合的最终状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    Succeeded(Evaluation),
    Failed(String),
}

impl From<PairOutcome> for CriterionEntry {
    fn from(outcome: PairOutcome) -> Self {
        match outcome {
            PairOutcome::Succeeded(evaluation) => CriterionEntry::success(evaluation),
            PairOutcome::Failed(message) => CriterionEntry::failure(message),
        }
    }
}

/// 结果文档：作文标识 → 维度 → 评分结果
///
/// 使用 `BTreeMap` 保证键顺序固定，相同输入得到相同的输出字节
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultDocument {
    essays: BTreeMap<String, BTreeMap<Criterion, CriterionEntry>>,
}

impl ResultDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一篇作文（即使它的所有组合都失败，也会出现在文档中）
    pub fn register_essay(&mut self, essay_id: &str) {
        self.essays.entry(essay_id.to_string()).or_default();
    }

    /// 记录一个组合的结果，已有记录会被覆盖
    pub fn record(&mut self, essay_id: &str, criterion: Criterion, outcome: PairOutcome) {
        self.essays
            .entry(essay_id.to_string())
            .or_default()
            .insert(criterion, outcome.into());
    }

    pub fn get(&self, essay_id: &str, criterion: Criterion) -> Option<&CriterionEntry> {
        self.essays.get(essay_id).and_then(|m| m.get(&criterion))
    }

    pub fn essay_ids(&self) -> impl Iterator<Item = &str> {
        self.essays.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.essays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.essays.is_empty()
    }

    /// 成功组合数
    pub fn success_count(&self) -> usize {
        self.entries().filter(|e| e.is_success()).count()
    }

    /// 失败组合数
    pub fn failure_count(&self) -> usize {
        self.entries().filter(|e| !e.is_success()).count()
    }

    /// 某篇作文是否五个维度都已成功
    pub fn is_complete(&self, essay_id: &str) -> bool {
        self.essays.get(essay_id).is_some_and(|m| {
            Criterion::ALL
                .iter()
                .all(|c| m.get(c).is_some_and(CriterionEntry::is_success))
        })
    }

    fn entries(&self) -> impl Iterator<Item = &CriterionEntry> {
        self.essays.values().flat_map(|m| m.values())
    }
}
