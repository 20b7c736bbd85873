//! Repository-relative path helpers.
//!
//! Relative paths inside reports always use `/`, whatever the host uses.

use std::path::{Path, PathBuf};

/// Replace `\` separators with `/` and drop leading/trailing/duplicate separators.
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    split_segments(path).join("/")
}

/// Split a relative path on either separator, skipping empty segments.
#[must_use]
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

/// Join a forward-slash relative path onto a host root.
#[must_use]
pub fn join_relative(root: &Path, relative: &str) -> PathBuf {
    split_segments(relative)
        .into_iter()
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Filename without its final extension (`"12_40.yaml"` -> `"12_40"`).
#[must_use]
pub fn file_stem(name: &str) -> &str {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators("7\\components\\12.yaml"), "7/components/12.yaml");
        assert_eq!(normalize_separators("/mappings//component-threats/"), "mappings/component-threats");
    }

    #[test]
    fn test_join_relative() {
        let joined = join_relative(Path::new("/repo"), "7/components/12.yaml");
        assert_eq!(joined, Path::new("/repo").join("7").join("components").join("12.yaml"));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("12_40.yaml"), "12_40");
        assert_eq!(file_stem("mappings/x/5_9.yaml"), "5_9");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".gitkeep"), ".gitkeep");
    }
}
