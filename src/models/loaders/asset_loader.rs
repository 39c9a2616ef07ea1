use std::collections::BTreeMap;
use std::path::Path;

use tokio::fs;

use crate::error::ConfigError;
use crate::models::criterion::Criterion;
use crate::models::rubric::{RubricBand, RubricTable};
use crate::services::prompt_builder::check_template;

/// 五个维度的提示词模板
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    templates: BTreeMap<Criterion, String>,
}

impl PromptTemplates {
    /// 从内存中的模板构建，会检查占位符
    pub fn new(templates: BTreeMap<Criterion, String>) -> Result<Self, ConfigError> {
        for criterion in Criterion::ALL {
            let template = templates.get(&criterion).ok_or_else(|| {
                ConfigError::PromptUnreadable {
                    path: criterion.prompt_file_name(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "模板缺失"),
                }
            })?;
            check_template(criterion, template)?;
        }
        Ok(Self { templates })
    }

    pub fn get(&self, criterion: Criterion) -> &str {
        self.templates
            .get(&criterion)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// 从提示词目录加载五个维度的模板
///
/// 任一文件缺失或缺少 `{rubrica}` 占位符都视为致命的配置错误
pub async fn load_prompt_templates(folder: &Path) -> Result<PromptTemplates, ConfigError> {
    let mut templates = BTreeMap::new();

    for criterion in Criterion::ALL {
        let path = folder.join(criterion.prompt_file_name());
        let content =
            fs::read_to_string(&path)
                .await
                .map_err(|source| ConfigError::PromptUnreadable {
                    path: path.display().to_string(),
                    source,
                })?;

        tracing::debug!("已加载提示词: {}", path.display());
        templates.insert(criterion, content);
    }

    PromptTemplates::new(templates)
}

/// 评分表 TOML 的文件结构：维度标识 → 分档列表
///
/// ```toml
/// [[c1_escrita_formal]]
/// score = 200
/// description = "Demonstra excelente domínio da modalidade escrita formal."
/// ```
type RubricFile = BTreeMap<String, Vec<RubricBand>>;

/// 从 TOML 文件加载评分表
pub async fn load_rubric(path: &Path) -> Result<RubricTable, ConfigError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::RubricUnreadable {
            path: path.display().to_string(),
            source,
        })?;

    parse_rubric(&content).map_err(|e| match e {
        RubricParse::Toml(source) => ConfigError::RubricParseFailed {
            path: path.display().to_string(),
            source,
        },
        RubricParse::Config(e) => e,
    })
}

enum RubricParse {
    Toml(toml::de::Error),
    Config(ConfigError),
}

fn parse_rubric(content: &str) -> Result<RubricTable, RubricParse> {
    let raw: RubricFile = toml::from_str(content).map_err(RubricParse::Toml)?;

    let mut bands = BTreeMap::new();
    for (key, list) in raw {
        match Criterion::from_key(&key) {
            Some(criterion) => {
                bands.insert(criterion, list);
            }
            None => tracing::warn!("评分表中存在未知维度，已忽略: {}", key),
        }
    }

    RubricTable::new(bands).map_err(RubricParse::Config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_rubric_toml() -> String {
        Criterion::ALL
            .iter()
            .map(|c| {
                format!(
                    "[[{key}]]\nscore = 0\ndescription = \"nada\"\n\n[[{key}]]\nscore = 200\ndescription = \"excelente\"\n\n",
                    key = c.key()
                )
            })
            .collect()
    }

    fn write_templates(dir: &Path, skip: Option<Criterion>, template: &str) {
        for criterion in Criterion::ALL {
            if Some(criterion) == skip {
                continue;
            }
            std::fs::write(dir.join(criterion.prompt_file_name()), template).unwrap();
        }
    }

    #[tokio::test]
    async fn test_load_prompt_templates() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path(), None, "Avalie.\n{rubrica}\n");

        let templates = load_prompt_templates(dir.path()).await.unwrap();
        assert!(templates.get(Criterion::Intervention).contains("{rubrica}"));
    }

    #[tokio::test]
    async fn test_missing_prompt_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path(), Some(Criterion::Cohesion), "{rubrica}");

        let err = load_prompt_templates(dir.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::PromptUnreadable { ref path, .. } if path.ends_with("c4_coesao.txt")));
    }

    #[tokio::test]
    async fn test_template_without_placeholder_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path(), None, "Avalie a redação.");

        let err = load_prompt_templates(dir.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingPlaceholder { .. }));
    }

    #[test]
    fn test_parse_rubric() {
        let table = match parse_rubric(&full_rubric_toml()) {
            Ok(table) => table,
            Err(_) => panic!("评分表应该解析成功"),
        };
        assert_eq!(table.range(Criterion::Argumentation), (0, 200));
        assert_eq!(table.describe(Criterion::Argumentation, 200), Some("excelente"));
    }

    #[test]
    fn test_parse_rubric_missing_criterion() {
        let content = "[[c1_escrita_formal]]\nscore = 0\ndescription = \"nada\"\n";
        assert!(matches!(
            parse_rubric(content),
            Err(RubricParse::Config(ConfigError::RubricMissingCriterion { .. }))
        ));
    }

    #[tokio::test]
    async fn test_load_rubric_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rubric(&dir.path().join("rubrica.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::RubricUnreadable { .. }));
    }

    #[tokio::test]
    async fn test_load_rubric_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rubrica.toml");
        std::fs::write(&path, "[[c1_escrita_formal]\nscore = ").unwrap();
        let err = load_rubric(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::RubricParseFailed { .. }));
    }
}
