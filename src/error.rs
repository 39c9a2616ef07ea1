//! 错误类型
//!
//! 按关注点拆分为多个枚举，统一汇总到 `AppError`：
//! - 配置 / 输入 / 输出错误：致命，直接终止程序
//! - LLM / 解析错误：只影响单个 (作文, 评分维度) 组合，记录后继续

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（缺少密钥、提示词或评分表）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 输入目录错误
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 模型返回内容解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
    /// 结果文件写入错误
    #[error("输出错误: {0}")]
    Output(#[from] OutputError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未提供 API 密钥
    #[error("未设置 API 密钥 (环境变量 {var_name})")]
    MissingApiKey { var_name: String },
    /// 提示词文件缺失或无法读取
    #[error("无法读取提示词文件 ({path}): {source}")]
    PromptUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 提示词模板缺少必需的占位符
    #[error("提示词模板 {criterion} 缺少占位符 {placeholder}")]
    MissingPlaceholder {
        criterion: String,
        placeholder: &'static str,
    },
    /// 评分表文件缺失或无法读取
    #[error("无法读取评分表 ({path}): {source}")]
    RubricUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 评分表 TOML 解析失败
    #[error("评分表解析失败 ({path}): {source}")]
    RubricParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 评分表缺少某个维度或分档为空
    #[error("评分表缺少维度 {criterion} 的分档")]
    RubricMissingCriterion { criterion: String },
}

/// 输入错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 作文目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取目录失败
    #[error("无法读取目录 ({path}): {source}")]
    DirectoryUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 读取作文文件失败
    #[error("无法读取作文 {id} ({path}): {source}")]
    EssayUnreadable {
        id: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    /// 对应的 IO 错误类别
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            InputError::DirectoryNotFound { .. } => std::io::ErrorKind::NotFound,
            InputError::DirectoryUnreadable { source, .. }
            | InputError::EssayUnreadable { source, .. } => source.kind(),
        }
    }
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 请求频率限制
    #[error("LLM API请求频率限制 (模型: {model}): {message}")]
    RateLimited { model: String, message: String },
    /// 单次调用超时
    #[error("LLM 调用超时 (模型: {model}, {timeout_secs}秒)")]
    Timeout { model: String, timeout_secs: u64 },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 请求构建失败
    #[error("LLM 请求构建失败: {message}")]
    InvalidRequest { message: String },
    /// 并发控制已关闭，调用未发出
    #[error("评分任务已取消: 并发控制已关闭")]
    Cancelled,
}

impl LlmError {
    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::InvalidRequest { .. } | LlmError::Cancelled)
    }
}

/// 模型返回内容解析错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// 无法识别的返回格式
    #[error("无法识别的返回格式: {response}")]
    UnrecognizedShape { response: String },
    /// 分数不是非负整数
    #[error("无效的分数: {value}")]
    InvalidScore { value: String },
    /// 分数超出评分表范围
    #[error("分数 {score} 超出评分范围 [{min}, {max}]")]
    ScoreOutOfBand { score: u32, min: u32, max: u32 },
}

/// 输出错误
#[derive(Debug, Error)]
pub enum OutputError {
    /// JSON 序列化失败
    #[error("结果序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建缺少 API 密钥错误
    pub fn missing_api_key(var_name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingApiKey {
            var_name: var_name.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_names_variable() {
        let err = AppError::missing_api_key("OPENAI_API_KEY");
        assert!(matches!(
            err,
            AppError::Config(ConfigError::MissingApiKey { .. })
        ));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_directory_not_found_kind() {
        let err = InputError::DirectoryNotFound {
            path: "nao_existe".to_string(),
        };
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_request_not_retryable() {
        let err = LlmError::InvalidRequest {
            message: "bad".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!LlmError::Cancelled.is_retryable());
        assert!(LlmError::Timeout {
            model: "m".to_string(),
            timeout_secs: 1
        }
        .is_retryable());
    }
}
