use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DATETIME_TAG: &str = "Image DateTime";
pub const MODEL_TAG: &str = "Image Model";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateSource {
    Exif,
    FallbackFileCreated,
}

/// Tag name -> raw value, as produced by the EXIF decoder for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTagSet {
    tags: BTreeMap<String, String>,
}

impl MetadataTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataTagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcquisitionInfo {
    pub taken_at: NaiveDateTime,
    pub date_source: DateSource,
    pub camera_model: Option<String>,
}

impl AcquisitionInfo {
    pub fn date_segment(&self) -> String {
        let d = self.taken_at;
        format!("{:04}{:02}{:02}", d.year(), d.month(), d.day())
    }

    pub fn time_segment(&self, with_seconds: bool) -> String {
        let t = self.taken_at;
        if with_seconds {
            format!("{:02}{:02}{:02}", t.hour(), t.minute(), t.second())
        } else {
            format!("{:02}{:02}", t.hour(), t.minute())
        }
    }

    pub fn model_token(&self) -> Option<&str> {
        self.camera_model.as_deref().filter(|s| !s.is_empty())
    }
}
