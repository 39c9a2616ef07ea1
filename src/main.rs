use anyhow::Result;
use corretor_redacao::utils::logging;
use corretor_redacao::{App, AppResult, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // Ctrl-C 时直接退出，不写结果文件
    tokio::select! {
        result = run(config) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("⚠️ 收到中断信号，程序终止");
            anyhow::bail!("interrupted");
        }
    }

    Ok(())
}

/// 初始化并运行应用
async fn run(config: Config) -> AppResult<()> {
    App::initialize(config).await?.run().await?;
    Ok(())
}
