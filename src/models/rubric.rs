use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ParseError};
use crate::models::criterion::Criterion;

/// 评分表中的一个分档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricBand {
    /// 分数
    pub score: u32,
    /// 该分数对应的描述
    pub description: String,
}

/// 评分表：每个维度的分数 → 描述对照
///
/// 启动时加载一次，运行期间只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubricTable {
    bands: BTreeMap<Criterion, Vec<RubricBand>>,
}

impl RubricTable {
    /// 从各维度的分档构建评分表
    ///
    /// 每个维度都必须存在且至少有一个分档，分档按分数升序保存
    pub fn new(mut bands: BTreeMap<Criterion, Vec<RubricBand>>) -> Result<Self, ConfigError> {
        for criterion in Criterion::ALL {
            match bands.get_mut(&criterion) {
                Some(list) if !list.is_empty() => list.sort_by_key(|b| b.score),
                _ => {
                    return Err(ConfigError::RubricMissingCriterion {
                        criterion: criterion.key().to_string(),
                    })
                }
            }
        }
        Ok(Self { bands })
    }

    /// 某个维度的全部分档（升序）
    pub fn bands(&self, criterion: Criterion) -> &[RubricBand] {
        self.bands
            .get(&criterion)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 某个维度的合法分数范围 `[min, max]`
    pub fn range(&self, criterion: Criterion) -> (u32, u32) {
        let bands = self.bands(criterion);
        let min = bands.first().map(|b| b.score).unwrap_or(0);
        let max = bands.last().map(|b| b.score).unwrap_or(0);
        (min, max)
    }

    /// 检查分数是否落在该维度的范围内
    pub fn validate(&self, criterion: Criterion, score: u32) -> Result<u32, ParseError> {
        let (min, max) = self.range(criterion);
        if score < min || score > max {
            return Err(ParseError::ScoreOutOfBand { score, min, max });
        }
        Ok(score)
    }

    /// 查找分数对应的描述：取不高于该分数的最高分档
    pub fn describe(&self, criterion: Criterion, score: u32) -> Option<&str> {
        self.bands(criterion)
            .iter()
            .rev()
            .find(|b| b.score <= score)
            .map(|b| b.description.as_str())
    }
}
