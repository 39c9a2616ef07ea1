use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InputError;
use crate::models::essay::Essay;

/// 作文目录
///
/// 只保存路径；每次调用 [`EssayDir::iter`] 都会重新读取目录，
/// 所以序列可以反复遍历，且按需逐个读取文件
#[derive(Debug, Clone)]
pub struct EssayDir {
    path: PathBuf,
}

impl EssayDir {
    /// 打开作文目录，目录不存在时返回 `DirectoryNotFound`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, InputError> {
        let path = path.into();
        if !path.is_dir() {
            return Err(InputError::DirectoryNotFound {
                path: path.display().to_string(),
            });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 遍历目录中的 `.txt` 文件（不递归）
    pub fn iter(&self) -> Result<EssayIter, InputError> {
        let entries = fs::read_dir(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                InputError::DirectoryNotFound {
                    path: self.path.display().to_string(),
                }
            } else {
                InputError::DirectoryUnreadable {
                    path: self.path.display().to_string(),
                    source,
                }
            }
        })?;
        Ok(EssayIter {
            dir: self.path.clone(),
            entries,
        })
    }

    /// 一次性读取全部作文，按标识排序
    ///
    /// 单个文件读取失败不会中断，原样保留在结果中交给调用方处理。
    /// 多个文件去掉扩展名后同名时（如 `a.txt` 与 `a.TXT`），改用完整文件名作标识
    pub async fn load_all(&self) -> Result<Vec<Result<Essay, InputError>>, InputError> {
        let dir = self.clone();
        let mut essays = tokio::task::spawn_blocking(move || {
            dir.iter().map(|iter| iter.collect::<Vec<_>>())
        })
        .await
        .map_err(|e| InputError::DirectoryUnreadable {
            path: self.path.display().to_string(),
            source: std::io::Error::other(e),
        })??;

        disambiguate_ids(&mut essays);
        essays.sort_by(|a, b| entry_id(a).cmp(entry_id(b)));
        Ok(essays)
    }
}

/// 作文迭代器，逐个读取文件内容
pub struct EssayIter {
    dir: PathBuf,
    entries: fs::ReadDir,
}

impl Iterator for EssayIter {
    type Item = Result<Essay, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    return Some(Err(InputError::DirectoryUnreadable {
                        path: self.dir.display().to_string(),
                        source,
                    }))
                }
            };

            let path = entry.path();
            if !is_essay_file(&path) {
                continue;
            }

            let id = essay_id(&path);
            tracing::debug!("正在读取作文: {}", path.display());

            return Some(match fs::read_to_string(&path) {
                Ok(text) => Ok(Essay::new(id, text, path)),
                Err(source) => Err(InputError::EssayUnreadable {
                    id,
                    path: path.display().to_string(),
                    source,
                }),
            });
        }
    }
}

/// 是否为作文文件：普通文件且扩展名为 txt（不区分大小写）
fn is_essay_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// 作文标识：文件名去掉扩展名
fn essay_id(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn entry_id(entry: &Result<Essay, InputError>) -> &str {
    match entry {
        Ok(essay) => &essay.id,
        Err(InputError::EssayUnreadable { id, .. }) => id,
        Err(_) => "",
    }
}

/// 让每个标识唯一：冲突的条目改用完整文件名，直到不再冲突
///
/// 目录内文件名唯一，所以最多把所有条目都换成文件名后终止
fn disambiguate_ids(entries: &mut [Result<Essay, InputError>]) {
    loop {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for entry in entries.iter() {
            if matches!(entry, Ok(_) | Err(InputError::EssayUnreadable { .. })) {
                *counts.entry(entry_id(entry).to_string()).or_default() += 1;
            }
        }

        let mut changed = false;
        for entry in entries.iter_mut() {
            let Some((id, file_name)) = id_and_file_name(entry) else {
                continue;
            };
            if counts.get(id.as_str()).copied().unwrap_or(0) > 1 && *id != file_name {
                tracing::warn!("⚠️ 作文标识 {} 重复，改用文件名 {}", id, file_name);
                *id = file_name;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}

fn id_and_file_name(entry: &mut Result<Essay, InputError>) -> Option<(&mut String, String)> {
    let (id, path) = match entry {
        Ok(essay) => (&mut essay.id, essay.path.as_path()),
        Err(InputError::EssayUnreadable { id, path, .. }) => (id, Path::new(path.as_str())),
        Err(_) => return None,
    };
    let file_name = path.file_name()?.to_string_lossy().to_string();
    Some((id, file_name))
}
