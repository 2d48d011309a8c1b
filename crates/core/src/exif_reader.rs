use crate::metadata::MetadataTagSet;
use anyhow::{Context as _, Result};
use exif::{Context, Error, Field, In, Reader, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

/// Decodes EXIF tags from an in-memory image. Undecodable input yields an empty set.
pub fn decode(bytes: &[u8]) -> MetadataTagSet {
    decode_from_reader(&mut Cursor::new(bytes))
}

pub fn read_tags(path: &Path) -> Result<MetadataTagSet> {
    let file = File::open(path)
        .with_context(|| format!("EXIF読み込み対象を開けませんでした: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    Ok(decode_from_reader(&mut buf))
}

fn decode_from_reader<R: BufRead + Seek>(reader: &mut R) -> MetadataTagSet {
    let exif = match Reader::new()
        .continue_on_error(true)
        .read_from_container(reader)
    {
        Ok(exif) => exif,
        // damaged thumbnail or maker-note IFDs must not hide the primary tags
        Err(Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            for err in errors {
                tracing::debug!("EXIFの一部を解析できませんでした: {err}");
            }
            exif
        }
        Err(err) => {
            tracing::debug!("EXIFを解析できませんでした: {err}");
            return MetadataTagSet::new();
        }
    };

    exif.fields()
        .map(|field| (tag_key(field), field_value(field, &exif)))
        .collect()
}

fn tag_key(field: &Field) -> String {
    let group = if field.ifd_num == In::THUMBNAIL {
        "Thumbnail"
    } else {
        match field.tag.context() {
            Context::Tiff => "Image",
            Context::Exif => "EXIF",
            Context::Gps => "GPS",
            _ => "Interoperability",
        }
    };
    format!("{} {}", group, field.tag)
}

fn field_value(field: &Field, exif: &exif::Exif) -> String {
    match field.value {
        // display_value() wraps ASCII in quotes
        Value::Ascii(ref parts) if !parts.is_empty() => String::from_utf8_lossy(&parts[0])
            .trim_end_matches('\0')
            .to_string(),
        _ => field.display_value().with_unit(exif).to_string(),
    }
}

/// Minimal little-endian TIFF stream holding ASCII tags in IFD0.
#[cfg(test)]
pub(crate) fn tiff_with_ascii_tags(tags: &[(u16, &str)]) -> Vec<u8> {
    let mut entries: Vec<(u16, Vec<u8>)> = tags
        .iter()
        .map(|(tag, value)| {
            let mut bytes = value.as_bytes().to_vec();
            bytes.push(0);
            (*tag, bytes)
        })
        .collect();
    entries.sort_by_key(|(tag, _)| *tag);

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    let mut data_offset = 8 + 2 + 12 * entries.len() + 4;
    let mut data = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, bytes) in &entries {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        if bytes.len() <= 4 {
            let mut inline = bytes.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&(data_offset as u32).to_le_bytes());
            data.extend_from_slice(bytes);
            if bytes.len() % 2 == 1 {
                data.push(0);
            }
            data_offset = 8 + 2 + 12 * entries.len() + 4 + data.len();
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data);
    out
}
