//! # 模式解析器
//!
//! 将一组 glob 模式展开为去重后的文件路径集合。
//!
//! ## 功能
//! - 展开开头的 `~` 为用户主目录
//! - shell 风格 glob 匹配（`*`, `?`, `[...]`），不递归
//! - 多模式结果合并去重，按路径排序
//! - 过滤掉目录等非普通文件（静默丢弃，不算错误）
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 和 `commands/info.rs` 调用
//! - 使用 `glob` crate

use crate::error::{PixbatchError, Result};

use glob::MatchOptions;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// 模式解析器
pub struct PatternResolver {
    /// 匹配模式列表
    patterns: Vec<String>,
    /// 用于展开 `~` 的主目录
    home: Option<PathBuf>,
}

impl PatternResolver {
    /// 创建新的模式解析器
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            home: home_dir(),
        }
    }

    /// 指定主目录（默认取 `HOME` / `USERPROFILE`）
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// 展开所有模式
    ///
    /// 没有匹配的模式不算错误，只有语法无效的模式才返回错误。
    pub fn resolve(&self) -> Result<BTreeSet<PathBuf>> {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let mut files = BTreeSet::new();

        for pattern in &self.patterns {
            let expanded = expand_home(pattern, self.home.as_ref());
            let paths = glob::glob_with(&expanded, options).map_err(|e| {
                PixbatchError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }
            })?;

            let before = files.len();
            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => {
                        files.insert(path);
                    }
                    Ok(path) => log::debug!("skipping non-file match {}", path.display()),
                    Err(e) => log::debug!("skipping unreadable match: {}", e),
                }
            }
            log::debug!(
                "pattern '{}' added {} file(s)",
                pattern,
                files.len() - before
            );
        }

        Ok(files)
    }
}

/// 展开开头的 `~`（仅 `~` 或 `~/...`）
fn expand_home(pattern: &str, home: Option<&PathBuf>) -> String {
    let Some(home) = home else {
        return pattern.to_string();
    };

    if pattern == "~" {
        return home.display().to_string();
    }

    match pattern
        .strip_prefix("~/")
        .or_else(|| pattern.strip_prefix("~\\"))
    {
        Some(rest) => home.join(rest).display().to_string(),
        None => pattern.to_string(),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pattern_in(dir: &tempfile::TempDir, pattern: &str) -> String {
        dir.path().join(pattern).display().to_string()
    }

    #[test]
    fn test_expand_home() {
        let home = PathBuf::from("/home/user");
        assert_eq!(
            expand_home("~/pics/*.png", Some(&home)),
            PathBuf::from("/home/user/pics/*.png").display().to_string()
        );
        assert_eq!(expand_home("~", Some(&home)), "/home/user");
        assert_eq!(expand_home("a/~/b", Some(&home)), "a/~/b");
        assert_eq!(expand_home("~other/x", Some(&home)), "~other/x");
        assert_eq!(expand_home("~/x", None), "~/x");
    }

    #[test]
    fn test_union_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        fs::write(dir.path().join("c.png"), b"x").unwrap();

        let resolver = PatternResolver::new(vec![
            pattern_in(&dir, "*.png"),
            pattern_in(&dir, "a.*"),
            pattern_in(&dir, "?.jpg"),
        ]);
        let files = resolver.resolve().unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.png"]);
    }

    #[test]
    fn test_directories_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("folder.png")).unwrap();
        fs::write(dir.path().join("real.png"), b"x").unwrap();

        let files = PatternResolver::new(vec![pattern_in(&dir, "*.png")])
            .resolve()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.iter().next().unwrap().ends_with("real.png"));
    }

    #[test]
    fn test_no_match_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = PatternResolver::new(vec![pattern_in(&dir, "*.tiff")])
            .resolve()
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_home_expansion_resolves() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("photo.gif"), b"x").unwrap();

        let files = PatternResolver::new(vec!["~/*.gif"])
            .with_home(Some(dir.path().to_path_buf()))
            .resolve()
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = PatternResolver::new(vec!["[unclosed"]).resolve();
        assert!(matches!(result, Err(PixbatchError::InvalidPattern { .. })));
    }
}
