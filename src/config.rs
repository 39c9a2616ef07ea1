use crate::error::{AppError, AppResult};

/// 读取 API 密钥的环境变量（按优先级）
pub const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "LLM_API_KEY"];

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 作文存放目录
    pub essay_folder: String,
    /// 评分维度提示词目录
    pub prompt_folder: String,
    /// 评分表文件
    pub rubric_file: String,
    /// 输出结果文件
    pub output_file: String,
    /// 失败记录文件（需要重跑的组合）
    pub warn_file: String,
    /// 同时进行的 LLM 调用数量（1 表示顺序执行）
    pub max_concurrent_calls: usize,
    /// 单次调用超时（秒）
    pub request_timeout_secs: u64,
    /// 失败后的最大重试次数
    pub max_retries: u32,
    /// 首次重试前的等待时间（毫秒），之后翻倍
    pub retry_backoff_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            essay_folder: "redacao".to_string(),
            prompt_folder: "prompts/system".to_string(),
            rubric_file: "prompts/rubrica.toml".to_string(),
            output_file: "resultado_nota.json".to_string(),
            warn_file: "falhas.txt".to_string(),
            max_concurrent_calls: 1,
            request_timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 2000,
            verbose_logging: false,
            llm_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    ///
    /// 这是唯一读取进程环境的地方，其余模块只接收 `Config`
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            essay_folder: std::env::var("ESSAY_FOLDER").unwrap_or(default.essay_folder),
            prompt_folder: std::env::var("PROMPT_FOLDER").unwrap_or(default.prompt_folder),
            rubric_file: std::env::var("RUBRIC_FILE").unwrap_or(default.rubric_file),
            output_file: std::env::var("OUTPUT_FILE").unwrap_or(default.output_file),
            warn_file: std::env::var("WARN_FILE").unwrap_or(default.warn_file),
            max_concurrent_calls: std::env::var("MAX_CONCURRENT_CALLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_calls),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            retry_backoff_ms: std::env::var("RETRY_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_backoff_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: first_non_empty(API_KEY_VARS.iter().map(|name| std::env::var(name).ok())).or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 获取 API 密钥，缺失或为空时返回配置错误
    pub fn require_api_key(&self) -> AppResult<&str> {
        match self.llm_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AppError::missing_api_key(API_KEY_VARS[0])),
        }
    }

    /// 实际使用的并发数（至少为 1）
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_calls.max(1)
    }
}

/// 第一个非空（去掉空白后）的值
fn first_non_empty(values: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    values
        .into_iter()
        .find_map(|value| value.filter(|v| !v.trim().is_empty()))
}
