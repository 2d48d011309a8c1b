//! Collision-free target paths and the final copy/move.
//!
//! Probing is check-then-act: a file created by another process between the probe and
//! the copy/rename is not detected. This is acceptable for a single-user batch tool.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    Copy,
    Move,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    pub final_path: PathBuf,
    /// 0 when the candidate was free, otherwise the appended `_N` (N >= 2).
    pub collision_suffix: usize,
}

pub fn resolve_collision(candidate: &Path) -> Placement {
    resolve_collision_with(candidate, None, &HashSet::new())
}

/// `keep` is a path that may be reused even though it exists (the file being renamed).
/// `reserved` holds targets already promised to earlier files in a dry run.
pub(crate) fn resolve_collision_with(
    candidate: &Path,
    keep: Option<&Path>,
    reserved: &HashSet<PathBuf>,
) -> Placement {
    let is_free = |path: &Path| {
        if reserved.contains(path) {
            return false;
        }
        if keep == Some(path) {
            return true;
        }
        !path.is_file()
    };

    if is_free(candidate) {
        return Placement {
            final_path: candidate.to_path_buf(),
            collision_suffix: 0,
        };
    }

    let parent = candidate.parent().unwrap_or_else(|| Path::new(""));
    let stem = candidate
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = candidate
        .extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 2usize;
    loop {
        let next = parent.join(format!("{}_{}{}", stem, n, suffix));
        if is_free(&next) {
            return Placement {
                final_path: next,
                collision_suffix: n,
            };
        }
        n += 1;
    }
}

pub fn place(source: &Path, target: &Path, mode: PlacementMode) -> Result<()> {
    match mode {
        PlacementMode::Copy => {
            fs::copy(source, target).with_context(|| {
                format!(
                    "コピーに失敗しました: {} -> {}",
                    source.display(),
                    target.display()
                )
            })?;
        }
        PlacementMode::Move => match fs::rename(source, target) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::CrossesDevices => move_by_copy(source, target)?,
            Err(err) => {
                return Err(anyhow::Error::from(err).context(format!(
                    "移動に失敗しました: {} -> {}",
                    source.display(),
                    target.display()
                )));
            }
        },
    }
    tracing::debug!(
        "{:?}: {} -> {}",
        mode,
        source.display(),
        target.display()
    );
    Ok(())
}

// rename(2) fails across filesystems; copy, verify the size, then drop the source.
fn move_by_copy(source: &Path, target: &Path) -> Result<()> {
    let source_len = fs::metadata(source)
        .with_context(|| format!("移動元を確認できませんでした: {}", source.display()))?
        .len();
    fs::copy(source, target).with_context(|| {
        format!(
            "移動に失敗しました: {} -> {}",
            source.display(),
            target.display()
        )
    })?;

    let target_len = fs::metadata(target)
        .with_context(|| format!("移動先を確認できませんでした: {}", target.display()))?
        .len();
    if target_len != source_len {
        let _ = fs::remove_file(target);
        anyhow::bail!(
            "移動先のサイズが一致しません ({} != {} bytes): {}",
            target_len,
            source_len,
            target.display()
        );
    }

    if let Err(err) = fs::remove_file(source) {
        let _ = fs::remove_file(target);
        return Err(anyhow::Error::from(err)
            .context(format!("移動元を削除できませんでした: {}", source.display())));
    }
    Ok(())
}
