use serde::{Deserialize, Serialize};

/// 评分维度（ENEM 作文的五项能力）
///
/// 顺序即输出顺序：C1 → C5
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Criterion {
    /// 书面语规范
    #[serde(rename = "c1_escrita_formal")]
    FormalWriting,
    /// 切题
    #[serde(rename = "c2_tema")]
    Theme,
    /// 论证
    #[serde(rename = "c3_argumentacao")]
    Argumentation,
    /// 衔接
    #[serde(rename = "c4_coesao")]
    Cohesion,
    /// 干预方案
    #[serde(rename = "c5_intervencao")]
    Intervention,
}

impl Criterion {
    /// 全部维度（按顺序）
    pub const ALL: [Criterion; 5] = [
        Criterion::FormalWriting,
        Criterion::Theme,
        Criterion::Argumentation,
        Criterion::Cohesion,
        Criterion::Intervention,
    ];

    /// 维度标识，同时也是 JSON 键名和提示词文件名
    pub fn key(self) -> &'static str {
        match self {
            Criterion::FormalWriting => "c1_escrita_formal",
            Criterion::Theme => "c2_tema",
            Criterion::Argumentation => "c3_argumentacao",
            Criterion::Cohesion => "c4_coesao",
            Criterion::Intervention => "c5_intervencao",
        }
    }

    /// 维度编号（1-5）
    pub fn number(self) -> u8 {
        match self {
            Criterion::FormalWriting => 1,
            Criterion::Theme => 2,
            Criterion::Argumentation => 3,
            Criterion::Cohesion => 4,
            Criterion::Intervention => 5,
        }
    }

    /// 提示词文件名
    pub fn prompt_file_name(self) -> String {
        format!("{}.txt", self.key())
    }

    /// 从标识解析维度
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
