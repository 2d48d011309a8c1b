use crate::config::app_paths;
use crate::placement::PlacementMode;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct Journal {
    pub(crate) operations: Vec<PlacedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct PlacedFile {
    pub(crate) from: PathBuf,
    pub(crate) to: PathBuf,
    pub(crate) mode: PlacementMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResult {
    pub restored: usize,
    pub removed_copies: usize,
    pub skipped: usize,
}

pub fn undo_last() -> Result<UndoResult> {
    let paths = app_paths()?;
    undo_journal(&paths.journal_path)
}

pub fn undo_journal(journal_path: &Path) -> Result<UndoResult> {
    if !journal_path.exists() {
        bail!("取り消し可能な履歴がありません");
    }

    let raw = fs::read_to_string(journal_path).with_context(|| {
        format!(
            "取り消しログを読めませんでした: {}",
            journal_path.display()
        )
    })?;
    let journal = serde_json::from_str::<Journal>(&raw).context("取り消しログが壊れています")?;

    let result = revert_operations(&journal)?;

    fs::remove_file(journal_path).with_context(|| {
        format!(
            "取り消しログ削除に失敗しました: {}",
            journal_path.display()
        )
    })?;

    Ok(result)
}

fn revert_operations(journal: &Journal) -> Result<UndoResult> {
    let mut result = UndoResult {
        restored: 0,
        removed_copies: 0,
        skipped: 0,
    };

    for op in journal.operations.iter().rev() {
        if !op.to.is_file() {
            result.skipped += 1;
            continue;
        }
        match op.mode {
            PlacementMode::Move => {
                if op.from.exists() {
                    result.skipped += 1;
                    continue;
                }
                fs::rename(&op.to, &op.from).with_context(|| {
                    format!(
                        "取り消しに失敗しました: {} -> {}",
                        op.to.display(),
                        op.from.display()
                    )
                })?;
                result.restored += 1;
            }
            PlacementMode::Copy => {
                fs::remove_file(&op.to).with_context(|| {
                    format!("コピーの削除に失敗しました: {}", op.to.display())
                })?;
                result.removed_copies += 1;
            }
        }
    }

    Ok(result)
}

pub(crate) fn persist_journal(journal_path: &Path, operations: &[PlacedFile]) -> Result<()> {
    if let Some(dir) = journal_path.parent() {
        fs::create_dir_all(dir).with_context(|| {
            format!("設定ディレクトリ作成に失敗しました: {}", dir.display())
        })?;
    }

    let journal = Journal {
        operations: operations.to_vec(),
    };
    let body = serde_json::to_string_pretty(&journal)
        .context("取り消しログのシリアライズに失敗しました")?;
    fs::write(journal_path, body).with_context(|| {
        format!(
            "取り消しログ書き込みに失敗しました: {}",
            journal_path.display()
        )
    })?;
    Ok(())
}
