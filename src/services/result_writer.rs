//! 结果写入服务 - 业务能力层
//!
//! 只负责把完整的结果文档写到磁盘

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::OutputError;
use crate::models::evaluation::ResultDocument;

/// 结果写入服务
///
/// 每次运行覆盖旧文件，不做合并。
/// 先写入同目录下的临时文件再重命名，避免留下写了一半的 JSON。
pub struct ResultWriter {
    output_path: PathBuf,
}

impl ResultWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// 序列化结果文档（带缩进，末尾换行）
    pub fn render(document: &ResultDocument) -> Result<String, OutputError> {
        let mut json = serde_json::to_string_pretty(document)?;
        json.push('\n');
        Ok(json)
    }

    /// 写入结果文档
    pub async fn write(&self, document: &ResultDocument) -> Result<(), OutputError> {
        let json = Self::render(document)?;
        let tmp_path = self.tmp_path();

        debug!(
            "写入结果: {} ({} 字节)",
            self.output_path.display(),
            json.len()
        );

        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.write_failed(source))?;
        }

        fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|source| self.write_failed(source))?;

        if let Err(source) = fs::rename(&tmp_path, &self.output_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(self.write_failed(source));
        }

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .output_path
            .file_name()
            .unwrap_or_default()
            .to_os_string();
        name.push(".tmp");
        self.output_path.with_file_name(name)
    }

    fn write_failed(&self, source: std::io::Error) -> OutputError {
        OutputError::WriteFailed {
            path: self.output_path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::criterion::Criterion;
    use crate::models::evaluation::{Evaluation, PairOutcome};

    fn document() -> ResultDocument {
        let mut doc = ResultDocument::new();
        doc.record(
            "essay1",
            Criterion::FormalWriting,
            PairOutcome::Succeeded(Evaluation {
                score: 160,
                description: "Desenvolvimento regular".to_string(),
            }),
        );
        doc
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resultado_nota.json");
        std::fs::write(&path, "{\"antigo\": {}}").unwrap();

        let writer = ResultWriter::new(&path);
        writer.write(&document()).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("antigo"));
        let parsed: ResultDocument = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, document());
        assert!(!dir.path().join("resultado_nota.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saida").join("notas.json");

        ResultWriter::new(&path).write(&document()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_write_into_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ocupado.json")).unwrap();

        let err = ResultWriter::new(dir.path().join("ocupado.json"))
            .write(&document())
            .await
            .unwrap_err();
        assert!(matches!(err, OutputError::WriteFailed { .. }));
    }

    #[test]
    fn test_render_ends_with_newline() {
        let json = ResultWriter::render(&document()).unwrap();
        assert!(json.ends_with("}\n"));
    }
}
