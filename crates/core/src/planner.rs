use crate::exif_reader::read_tags;
use crate::filename::{compose_filename, validate_tag, FilenameOptions};
use crate::journal::{persist_journal, PlacedFile};
use crate::metadata::DateSource;
use crate::placement::{place, resolve_collision_with, PlacementMode};
use crate::resolver::{resolve, ResolveWarning};
use crate::source::{list_source_files, ListingStats, SourceFile};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SortOptions {
    pub input_dir: PathBuf,
    /// `None` renames in place.
    pub output_dir: Option<PathBuf>,
    pub mode: PlacementMode,
    pub filename: FilenameOptions,
    pub tag: Option<String>,
    pub dry_run: bool,
    pub journal_path: Option<PathBuf>,
}

impl SortOptions {
    /// Copies into `output_dir` when given, otherwise renames inside `input_dir`.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        let mode = if output_dir.is_some() {
            PlacementMode::Copy
        } else {
            PlacementMode::Move
        };
        Self {
            input_dir: input_dir.into(),
            output_dir,
            mode,
            filename: FilenameOptions::default(),
            tag: None,
            dry_run: false,
            journal_path: None,
        }
    }

    pub fn target_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileStatus {
    Placed,
    Planned,
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub target: Option<PathBuf>,
    pub date_source: Option<DateSource>,
    pub collision_suffix: usize,
    pub warnings: Vec<ResolveWarning>,
    pub error: Option<String>,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SortStats {
    pub scanned: usize,
    pub skipped_hidden: usize,
    pub skipped_dirs: usize,
    pub placed: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl From<ListingStats> for SortStats {
    fn from(listing: ListingStats) -> Self {
        Self {
            scanned: listing.scanned,
            skipped_hidden: listing.skipped_hidden,
            skipped_dirs: listing.skipped_dirs,
            ..Self::default()
        }
    }
}

impl SortStats {
    fn record(&mut self, outcome: &FileOutcome) {
        self.warnings += outcome.warnings.len();
        match outcome.status {
            FileStatus::Placed => self.placed += 1,
            FileStatus::Planned => self.planned += 1,
            FileStatus::Unchanged => self.unchanged += 1,
            FileStatus::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub target_dir: PathBuf,
    pub mode: PlacementMode,
    pub dry_run: bool,
    pub outcomes: Vec<FileOutcome>,
    pub stats: SortStats,
}

/// Runs the whole batch. Only an unusable input/output directory, an invalid tag or a
/// journal write failure is returned as `Err`; per-file problems end up in the report.
pub fn sort_photos(options: &SortOptions) -> Result<SortReport> {
    if let Some(tag) = options.tag.as_deref() {
        validate_tag(tag)?;
    }

    let (sources, listing) = list_source_files(&options.input_dir)?;

    let target_dir = options.target_dir().to_path_buf();
    if options.output_dir.is_some() && !options.dry_run {
        fs::create_dir_all(&target_dir).with_context(|| {
            format!(
                "出力フォルダを作成できませんでした: {}",
                target_dir.display()
            )
        })?;
    }

    let mut stats = SortStats::from(listing);
    let mut reserved = HashSet::<PathBuf>::new();
    let mut placed = Vec::<PlacedFile>::new();
    let mut outcomes = Vec::with_capacity(sources.len());

    for source in &sources {
        let outcome = process_file(source, &target_dir, options, &mut reserved, &mut placed);
        stats.record(&outcome);
        outcomes.push(outcome);
    }

    if !options.dry_run && !placed.is_empty() {
        if let Some(journal_path) = options.journal_path.as_deref() {
            persist_journal(journal_path, &placed)?;
        }
    }

    Ok(SortReport {
        target_dir,
        mode: options.mode,
        dry_run: options.dry_run,
        outcomes,
        stats,
    })
}

fn process_file(
    source: &SourceFile,
    target_dir: &Path,
    options: &SortOptions,
    reserved: &mut HashSet<PathBuf>,
    placed: &mut Vec<PlacedFile>,
) -> FileOutcome {
    let mut outcome = FileOutcome {
        source: source.path.clone(),
        target: None,
        date_source: None,
        collision_suffix: 0,
        warnings: Vec::new(),
        error: None,
        status: FileStatus::Failed,
    };

    let tags = match read_tags(&source.path) {
        Ok(tags) => tags,
        Err(err) => {
            outcome.error = Some(format!("{err:#}"));
            return outcome;
        }
    };
    let fallback = match source.created_at() {
        Ok(created) => created,
        Err(err) => {
            outcome.error = Some(format!("{err:#}"));
            return outcome;
        }
    };

    let resolution = resolve(&tags, fallback);
    outcome.date_source = Some(resolution.info.date_source);
    outcome.warnings = resolution.warnings;

    let name = compose_filename(
        &resolution.info,
        options.filename,
        options.tag.as_deref(),
        &source.extension(),
    );
    let keep = (options.mode == PlacementMode::Move).then_some(source.path.as_path());
    let placement = resolve_collision_with(&target_dir.join(name), keep, reserved);
    outcome.target = Some(placement.final_path.clone());
    outcome.collision_suffix = placement.collision_suffix;

    if placement.final_path == source.path {
        tracing::debug!("変更なし: {}", source.path.display());
        outcome.status = FileStatus::Unchanged;
        return outcome;
    }

    if options.dry_run {
        reserved.insert(placement.final_path);
        outcome.status = FileStatus::Planned;
        return outcome;
    }

    match place(&source.path, &placement.final_path, options.mode) {
        Ok(()) => {
            placed.push(PlacedFile {
                from: source.path.clone(),
                to: placement.final_path,
                mode: options.mode,
            });
            outcome.status = FileStatus::Placed;
        }
        Err(err) => {
            outcome.error = Some(format!("{err:#}"));
        }
    }

    outcome
}
