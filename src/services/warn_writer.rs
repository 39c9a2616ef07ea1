//! 失败记录服务 - 业务能力层
//!
//! 只负责"写失败清单"能力，不关心流程

use anyhow::Result;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 失败记录服务
///
/// 职责：
/// - 将评分失败的 (作文, 维度) 组合追加到清单文件，方便重跑
/// - 只处理单个组合
/// - 不关心流程顺序
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 清空清单并写入带时间戳的表头
    pub async fn init(&self) -> Result<()> {
        let header = format!(
            "{}\n评分失败清单 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.warn_file_path, header).await?;
        Ok(())
    }

    /// 写入一条失败记录
    ///
    /// # 参数
    /// - `essay_id`: 作文标识
    /// - `criterion`: 维度标识
    /// - `error`: 失败原因
    pub async fn write(&self, essay_id: &str, criterion: &str, error: &str) -> Result<()> {
        debug!("写入失败记录: 作文 {} | 维度 {}", essay_id, criterion);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await?;

        let warn_msg = format!(
            "{} | {} | {}\n",
            essay_id,
            criterion,
            error.replace('\n', " ")
        );

        file.write_all(warn_msg.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
