mod config;
mod exif_reader;
mod filename;
mod journal;
mod metadata;
mod placement;
mod planner;
mod resolver;
mod source;

pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use exif_reader::{decode, read_tags};
pub use filename::{
    compose_filename, validate_tag, FilenameOptions, FilenameParts, TagError, TimePrecision,
};
pub use journal::{undo_journal, undo_last, UndoResult};
pub use metadata::{AcquisitionInfo, DateSource, MetadataTagSet, DATETIME_TAG, MODEL_TAG};
pub use placement::{place, resolve_collision, Placement, PlacementMode};
pub use planner::{sort_photos, FileOutcome, FileStatus, SortOptions, SortReport, SortStats};
pub use resolver::{parse_exif_datetime, resolve, simplify_camera_model, Resolution, ResolveWarning};
pub use source::{list_source_files, ListingStats, SourceFile};
