//! 提示词构建 - 业务能力层
//!
//! 纯函数：维度模板 + 评分表 + 作文原文 → 发给 LLM 的请求

use crate::error::ConfigError;
use crate::models::criterion::Criterion;
use crate::models::rubric::RubricBand;

/// 模板中必须出现的占位符，会被替换为评分表
pub const RUBRIC_PLACEHOLDER: &str = "{rubrica}";

/// 追加在系统消息末尾的回复格式要求
pub const REPLY_FORMAT: &str = "Responda APENAS com um objeto JSON, sem texto adicional, no formato:\n\
{\"score\": <nota numérica>, \"description\": \"<justificativa curta>\"}";

/// 发给 LLM 的一次请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// 系统消息：评分说明 + 评分表 + 回复格式
    pub system: String,
    /// 用户消息：作文原文
    pub user: String,
}

/// 检查模板是否包含必需的占位符
pub fn check_template(criterion: Criterion, template: &str) -> Result<(), ConfigError> {
    if template.contains(RUBRIC_PLACEHOLDER) {
        Ok(())
    } else {
        Err(ConfigError::MissingPlaceholder {
            criterion: criterion.key().to_string(),
            placeholder: RUBRIC_PLACEHOLDER,
        })
    }
}

/// 构建单个 (作文, 维度) 的请求
///
/// # 参数
/// - `criterion`: 评分维度
/// - `template`: 该维度的提示词模板
/// - `bands`: 该维度的评分分档
/// - `essay_text`: 作文原文
pub fn build_prompt(
    criterion: Criterion,
    template: &str,
    bands: &[RubricBand],
    essay_text: &str,
) -> Result<PromptRequest, ConfigError> {
    check_template(criterion, template)?;

    let system = format!(
        "{}\n\n{}",
        template.trim_end().replace(RUBRIC_PLACEHOLDER, &render_rubric(bands)),
        REPLY_FORMAT
    );

    Ok(PromptRequest {
        system,
        user: essay_text.trim().to_string(),
    })
}

/// 把评分分档渲染为列表，每行一个分档
fn render_rubric(bands: &[RubricBand]) -> String {
    bands
        .iter()
        .map(|b| format!("- {}: {}", b.score, b.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> Vec<RubricBand> {
        vec![
            RubricBand {
                score: 0,
                description: "Fuga ao tema".to_string(),
            },
            RubricBand {
                score: 160,
                description: "Desenvolvimento regular".to_string(),
            },
        ]
    }

    #[test]
    fn test_build_prompt_renders_rubric() {
        let request = build_prompt(
            Criterion::Theme,
            "Avalie o tema.\n\nNíveis:\n{rubrica}\n",
            &bands(),
            "  Texto de exemplo.\n",
        )
        .unwrap();

        assert!(request
            .system
            .contains("Níveis:\n- 0: Fuga ao tema\n- 160: Desenvolvimento regular"));
        assert!(request.system.ends_with(REPLY_FORMAT));
        assert!(!request.system.contains(RUBRIC_PLACEHOLDER));
        assert_eq!(request.user, "Texto de exemplo.");
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let a = build_prompt(Criterion::Cohesion, "{rubrica}", &bands(), "x").unwrap();
        let b = build_prompt(Criterion::Cohesion, "{rubrica}", &bands(), "x").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_placeholder() {
        let err = build_prompt(Criterion::Intervention, "Avalie.", &bands(), "x").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingPlaceholder { ref criterion, .. } if criterion == "c5_intervencao"
        ));
    }
}
