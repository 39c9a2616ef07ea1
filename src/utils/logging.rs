/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 `debug` 或 `info`。
/// 重复调用不会 panic（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 作文评分模式");
    info!("🤖 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    info!("📊 最大并发数: {}", config.concurrency());
    info!("{}", "=".repeat(60));
}

/// 记录作文加载信息
///
/// # 参数
/// - `essays`: 作文数量
/// - `criteria`: 评分维度数量
pub fn log_essays_loaded(essays: usize, criteria: usize) {
    info!("✓ 找到 {} 篇待评分的作文", essays);
    info!("📋 共 {} 个评分任务 ({} 个维度)\n", essays * criteria, criteria);
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `output_file`: 结果文件路径
pub fn print_final_stats(success: usize, failed: usize, output_file: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部评分完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, success + failed);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_file.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
