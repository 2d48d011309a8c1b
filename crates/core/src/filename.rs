use crate::metadata::AcquisitionInfo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SEGMENT_SEPARATOR: &str = "_";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimePrecision {
    /// `HHMM`
    Minute,
    /// `HHMMSS`
    #[default]
    Second,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilenameOptions {
    pub include_time: bool,
    pub precision: TimePrecision,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("タグにパス区切り文字は使えません: {0}")]
    PathSeparator(String),
    #[error("タグに制御文字は使えません: {0:?}")]
    ControlCharacter(String),
    #[error("タグ \"{0}\" はファイル名として使えません")]
    Reserved(String),
}

/// Ordered name segments: date, [time], [tag], [model].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameParts {
    segments: Vec<String>,
}

impl FilenameParts {
    pub fn new(info: &AcquisitionInfo, options: FilenameOptions, tag: Option<&str>) -> Self {
        let mut segments = vec![info.date_segment()];
        if options.include_time {
            segments.push(info.time_segment(options.precision == TimePrecision::Second));
        }
        if let Some(tag) = tag.filter(|t| !t.is_empty()) {
            segments.push(tag.to_string());
        }
        if let Some(model) = info.model_token() {
            segments.push(model.to_string());
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn stem(&self) -> String {
        self.segments.join(SEGMENT_SEPARATOR)
    }

    pub fn with_extension(&self, extension_with_dot: &str) -> String {
        format!("{}{}", self.stem(), extension_with_dot)
    }
}

/// The tag is inserted verbatim; run [`validate_tag`] first when it comes from user input.
pub fn compose_filename(
    info: &AcquisitionInfo,
    options: FilenameOptions,
    tag: Option<&str>,
    extension_with_dot: &str,
) -> String {
    FilenameParts::new(info, options, tag).with_extension(extension_with_dot)
}

pub fn validate_tag(tag: &str) -> Result<(), TagError> {
    if tag.contains(['/', '\\']) {
        return Err(TagError::PathSeparator(tag.to_string()));
    }
    if tag.chars().any(|c| c == '\0' || c.is_control()) {
        return Err(TagError::ControlCharacter(tag.to_string()));
    }
    if tag == "." || tag == ".." {
        return Err(TagError::Reserved(tag.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DateSource;
    use chrono::NaiveDate;

    fn info(model: Option<&str>) -> AcquisitionInfo {
        AcquisitionInfo {
            taken_at: NaiveDate::from_ymd_opt(2023, 7, 4)
                .and_then(|d| d.and_hms_opt(15, 30, 9))
                .expect("valid datetime"),
            date_source: DateSource::Exif,
            camera_model: model.map(str::to_string),
        }
    }

    fn with_time(precision: TimePrecision) -> FilenameOptions {
        FilenameOptions {
            include_time: true,
            precision,
        }
    }

    #[test]
    fn compose_orders_all_segments() {
        let name = compose_filename(
            &info(Some("iphone12")),
            with_time(TimePrecision::Second),
            Some("paris"),
            ".jpg",
        );
        assert_eq!(name, "20230704_153009_paris_iphone12.jpg");
    }

    #[test]
    fn compose_date_only() {
        let name = compose_filename(&info(None), FilenameOptions::default(), None, ".jpg");
        assert_eq!(name, "20230704.jpg");
    }

    #[test]
    fn compose_minute_precision_drops_seconds() {
        let name = compose_filename(
            &info(None),
            with_time(TimePrecision::Minute),
            None,
            ".HEIC",
        );
        assert_eq!(name, "20230704_1530.HEIC");
    }

    #[test]
    fn compose_skips_empty_tag_and_empty_model() {
        let name = compose_filename(&info(Some("")), FilenameOptions::default(), Some(""), ".png");
        assert_eq!(name, "20230704.png");
    }

    #[test]
    fn compose_keeps_tag_before_model_without_time() {
        let parts = FilenameParts::new(
            &info(Some("xt5")),
            FilenameOptions::default(),
            Some("Summer Trip"),
        );
        assert_eq!(parts.segments(), ["20230704", "Summer Trip", "xt5"]);
        assert_eq!(parts.with_extension(""), "20230704_Summer Trip_xt5");
    }

    #[test]
    fn validate_tag_rejects_separators_and_control_chars() {
        assert!(validate_tag("paris-2023").is_ok());
        assert!(matches!(
            validate_tag("a/b"),
            Err(TagError::PathSeparator(_))
        ));
        assert!(matches!(
            validate_tag("a\\b"),
            Err(TagError::PathSeparator(_))
        ));
        assert!(matches!(
            validate_tag("tab\there"),
            Err(TagError::ControlCharacter(_))
        ));
        assert_eq!(validate_tag(".."), Err(TagError::Reserved("..".to_string())));
    }
}
