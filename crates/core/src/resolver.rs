use crate::metadata::{AcquisitionInfo, DateSource, MetadataTagSet, DATETIME_TAG, MODEL_TAG};
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Recoverable conditions met while resolving one file. None of them fail the file.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum ResolveWarning {
    #[error("撮影日時タグがありません。ファイル作成日時を使用します")]
    MissingDateTime,
    #[error("撮影日時タグを解析できませんでした ({raw:?})。ファイル作成日時を使用します")]
    MalformedDateTime { raw: String },
    #[error("カメラ機種タグがありません")]
    MissingCameraModel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub info: AcquisitionInfo,
    pub warnings: Vec<ResolveWarning>,
}

pub fn resolve(tags: &MetadataTagSet, fallback: NaiveDateTime) -> Resolution {
    let mut warnings = Vec::new();

    let (taken_at, date_source) = match tags.get(DATETIME_TAG) {
        Some(raw) => match parse_exif_datetime(raw) {
            Some(dt) => (dt, DateSource::Exif),
            None => {
                warnings.push(ResolveWarning::MalformedDateTime {
                    raw: raw.to_string(),
                });
                (fallback, DateSource::FallbackFileCreated)
            }
        },
        None => {
            warnings.push(ResolveWarning::MissingDateTime);
            (fallback, DateSource::FallbackFileCreated)
        }
    };

    let camera_model = match tags.get(MODEL_TAG) {
        Some(raw) => Some(simplify_camera_model(raw)).filter(|m| !m.is_empty()),
        None => {
            warnings.push(ResolveWarning::MissingCameraModel);
            None
        }
    };

    Resolution {
        info: AcquisitionInfo {
            taken_at,
            date_source,
            camera_model,
        },
        warnings,
    }
}

pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT).ok()
}

/// Lowercase alphanumeric token for a free-text camera model, e.g. `Canon EOS 80D` -> `canoneos80d`.
pub fn simplify_camera_model(model: &str) -> String {
    model
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
