use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Extension including its leading dot, or empty.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|v| format!(".{}", v.to_string_lossy()))
            .unwrap_or_default()
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .with_context(|| format!("ファイルを読めませんでした: {}", self.path.display()))
    }

    /// Filesystem creation time in local time. Platforms without birth time report the
    /// modification time instead.
    pub fn created_at(&self) -> Result<NaiveDateTime> {
        let meta = fs::metadata(&self.path).with_context(|| {
            format!(
                "ファイル情報を取得できませんでした: {}",
                self.path.display()
            )
        })?;
        let time = meta.created().or_else(|_| meta.modified()).with_context(|| {
            format!(
                "ファイル作成日時を取得できませんでした: {}",
                self.path.display()
            )
        })?;
        Ok(DateTime::<Local>::from(time).naive_local())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ListingStats {
    pub scanned: usize,
    pub skipped_hidden: usize,
    pub skipped_dirs: usize,
}

/// Snapshot of the regular, non-hidden files directly inside `dir`, sorted by name.
pub fn list_source_files(dir: &Path) -> Result<(Vec<SourceFile>, ListingStats)> {
    let meta = fs::metadata(dir)
        .with_context(|| format!("入力フォルダを読めませんでした: {}", dir.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("入力パスがフォルダではありません: {}", dir.display());
    }

    let mut stats = ListingStats::default();
    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("フォルダ走査に失敗しました: {}", dir.display()))?;
        stats.scanned += 1;

        if is_hidden(entry.path()) {
            stats.skipped_hidden += 1;
            continue;
        }
        if !entry.path().is_file() {
            stats.skipped_dirs += 1;
            continue;
        }
        out.push(SourceFile::new(entry.into_path()));
    }

    Ok((out, stats))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{list_source_files, SourceFile};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn listing_skips_hidden_entries_and_directories() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("b.jpg"), b"b").expect("write b");
        fs::write(temp.path().join("a.JPG"), b"a").expect("write a");
        fs::write(temp.path().join(".DS_Store"), b"x").expect("write hidden");
        fs::create_dir_all(temp.path().join("nested")).expect("create nested");
        fs::write(temp.path().join("nested").join("c.jpg"), b"c").expect("write nested");

        let (files, stats) = list_source_files(temp.path()).expect("listing");
        let names: Vec<String> = files.iter().map(SourceFile::base_name).collect();
        assert_eq!(names, vec!["a.JPG", "b.jpg"]);
        assert_eq!(stats.scanned, 4);
        assert_eq!(stats.skipped_hidden, 1);
        assert_eq!(stats.skipped_dirs, 1);
    }

    #[test]
    fn listing_missing_directory_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let err = list_source_files(&temp.path().join("nope")).expect_err("must fail");
        assert!(err.to_string().contains("入力フォルダを読めませんでした"));
    }

    #[test]
    fn extension_keeps_leading_dot_and_case() {
        assert_eq!(SourceFile::new("/p/IMG_0001.JPG").extension(), ".JPG");
        assert_eq!(SourceFile::new("/p/archive.tar.gz").extension(), ".gz");
        assert_eq!(SourceFile::new("/p/README").extension(), "");
    }

    #[test]
    fn created_at_reads_filesystem_time() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("a.jpg");
        fs::write(&path, b"a").expect("write");
        let source = SourceFile::new(&path);
        assert!(source.created_at().is_ok());
        assert_eq!(source.read_bytes().expect("read"), b"a");
    }
}
