//! 结果解析 - 业务能力层
//!
//! 从 LLM 的原始回复中提取分数和描述

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::models::criterion::Criterion;
use crate::models::evaluation::Evaluation;
use crate::models::rubric::RubricTable;
use crate::utils::truncate_text;

/// 模型回复的 JSON 结构（兼容葡语键名）
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(alias = "nota")]
    score: Value,
    #[serde(default, alias = "descricao", alias = "descrição", alias = "justificativa")]
    description: Option<String>,
}

fn code_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)\s*```").expect("valid regex"))
}

fn bare_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(?:[.,]\d+)?$").expect("valid regex"))
}

/// 解析单个 (作文, 维度) 的回复
///
/// 1. 去掉 Markdown 代码块，解析其中的 JSON 对象
/// 2. 回复只有一个数字时，直接作为分数，描述取评分表中对应分档
/// 3. 分数必须落在该维度的评分范围内
pub fn parse_reply(
    reply: &str,
    criterion: Criterion,
    rubric: &RubricTable,
) -> Result<Evaluation, ParseError> {
    let body = strip_code_fence(reply);

    let (score, description) = if let Some(raw) = extract_json(body) {
        (parse_score(&raw.score)?, raw.description)
    } else if bare_number().is_match(body) {
        debug!("回复为纯数字: {}", body);
        (parse_score_str(body)?, None)
    } else {
        return Err(ParseError::UnrecognizedShape {
            response: truncate_text(reply.trim(), 200),
        });
    };

    let score = rubric.validate(criterion, score)?;

    let description = match description.map(|d| d.trim().to_string()) {
        Some(d) if !d.is_empty() => d,
        _ => rubric
            .describe(criterion, score)
            .unwrap_or_default()
            .to_string(),
    };

    Ok(Evaluation { score, description })
}

fn strip_code_fence(reply: &str) -> &str {
    code_fence()
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply)
        .trim()
}

/// 从第一个能解析的 `{` 开始读取一个 JSON 对象，忽略其后的文字
fn extract_json(body: &str) -> Option<RawReply> {
    body.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&body[start..])
            .into_iter::<RawReply>()
            .next()?
            .ok()
    })
}

fn parse_score(value: &Value) -> Result<u32, ParseError> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                u32::try_from(v).map_err(|_| invalid(value))
            } else {
                n.as_f64()
                    .and_then(integral)
                    .ok_or_else(|| invalid(value))
            }
        }
        Value::String(s) => parse_score_str(s.trim()),
        _ => Err(invalid(value)),
    }
}

fn parse_score_str(s: &str) -> Result<u32, ParseError> {
    s.replace(',', ".")
        .parse::<f64>()
        .ok()
        .and_then(integral)
        .ok_or_else(|| ParseError::InvalidScore {
            value: s.to_string(),
        })
}

/// 非负且没有小数部分的数才是合法分数
fn integral(v: f64) -> Option<u32> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) {
        Some(v as u32)
    } else {
        None
    }
}

fn invalid(value: &Value) -> ParseError {
    ParseError::InvalidScore {
        value: value.to_string(),
    }
}
