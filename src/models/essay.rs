use std::path::PathBuf;

/// 一篇待评分的作文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Essay {
    /// 作文标识（文件名去掉扩展名）
    pub id: String,
    /// 作文原文
    pub text: String,
    /// 来源文件
    pub path: PathBuf,
}

impl Essay {
    pub fn new(id: impl Into<String>, text: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            path: path.into(),
        }
    }
}
