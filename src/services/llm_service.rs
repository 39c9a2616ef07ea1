//! LLM 服务 - 业务能力层
//!
//! 只负责"调用 LLM"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, LlmError};
use crate::services::prompt_builder::PromptRequest;

/// 文本生成能力
///
/// 输入一次请求，返回模型的原始文本或错误。
/// 生产环境使用 [`LlmService`]，测试中可以替换为确定性的桩实现。
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 模型名称（用于日志和错误信息）
    fn model_name(&self) -> &str;

    /// 发送一次请求
    async fn complete(&self, request: &PromptRequest) -> Result<String, LlmError>;
}

/// LLM 服务
///
/// 职责：
/// - 调用兼容 OpenAI 的 Chat Completions 接口
/// - 只处理单次请求，不关心是哪篇作文、哪个维度
/// - 超时和重试由流程层负责
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    ///
    /// API 密钥缺失时返回配置错误
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config.require_api_key()?;

        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Ok(Self {
            client,
            model_name: config.llm_model_name.clone(),
        })
    }

    /// 构建请求消息：系统消息 + 作文
    fn build_messages(
        &self,
        request: &PromptRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system.as_str())
            .build()
            .map_err(invalid_request)?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user.as_str())
            .build()
            .map_err(invalid_request)?;

        Ok(vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ])
    }

    /// 把 API 错误归类为限流或普通调用失败
    fn classify_error(&self, message: String) -> LlmError {
        let lower = message.to_lowercase();
        if lower.contains("rate limit") || lower.contains("rate_limit") || lower.contains("429") {
            LlmError::RateLimited {
                model: self.model_name.clone(),
                message,
            }
        } else {
            LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                message,
            }
        }
    }
}

#[async_trait]
impl ChatModel for LlmService {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: &PromptRequest) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("作文长度: {} 字符", request.user.chars().count());

        let messages = self.build_messages(request)?;

        // 评分需要尽量稳定，温度设为 0
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(1024u32)
            .build()
            .map_err(invalid_request)?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                self.classify_error(e.to_string())
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

fn invalid_request(e: impl std::fmt::Display) -> LlmError {
    LlmError::InvalidRequest {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> LlmService {
        let config = Config {
            llm_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        LlmService::new(&config).unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = LlmService::new(&Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_rate_limit() {
        let service = create_test_service();
        assert!(matches!(
            service.classify_error("Rate limit reached for gpt-4o-mini".to_string()),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            service.classify_error("connection reset".to_string()),
            LlmError::ApiCallFailed { .. }
        ));
    }

    #[test]
    fn test_build_messages() {
        let service = create_test_service();
        let messages = service
            .build_messages(&PromptRequest {
                system: "Avalie.".to_string(),
                user: "Texto de exemplo.".to_string(),
            })
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    /// 真实 API 调用，需要设置 OPENAI_API_KEY
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_complete_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_complete_live() {
        crate::utils::logging::init(true);

        let service = LlmService::new(&Config::from_env()).expect("需要设置 OPENAI_API_KEY");
        let response = service
            .complete(&PromptRequest {
                system: "Responda apenas com o número 160.".to_string(),
                user: "Texto de exemplo.".to_string(),
            })
            .await;

        match response {
            Ok(text) => {
                println!("LLM 响应: {}", text);
                assert!(!text.is_empty());
            }
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }
}
