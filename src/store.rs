use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::drawing::{Drawing, Segment};
use crate::error::StoreError;

/// File extension used by the save and load dialogs
pub const FILE_EXTENSION: &str = "bbf";

// Saved as a JSON array of these. Older files write coordinates as floats
// and the width as a string such as "3.0".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Line(LineRecord),
    /// Any kind this version does not draw
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    #[serde(deserialize_with = "deserialize_coords")]
    pub coords: [i32; 4],
    pub fill: Color,
    #[serde(serialize_with = "serialize_width", deserialize_with = "deserialize_width")]
    pub width: u32,
}

impl From<&Segment> for LineRecord {
    fn from(segment: &Segment) -> Self {
        Self {
            coords: segment.coords(),
            fill: segment.color().clone(),
            width: segment.width(),
        }
    }
}

impl From<LineRecord> for Segment {
    fn from(record: LineRecord) -> Self {
        Segment::new(record.coords, record.fill, record.width)
    }
}

fn deserialize_coords<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[i32; 4], D::Error> {
    let raw = <[f64; 4]>::deserialize(deserializer)?;
    let mut coords = [0; 4];
    for (slot, value) in coords.iter_mut().zip(raw) {
        let rounded = value.round();
        if !rounded.is_finite() || rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
            return Err(de::Error::custom(format!("coordinate {} is out of range", value)));
        }
        *slot = rounded as i32;
    }
    Ok(coords)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWidth {
    Number(f64),
    Text(String),
}

fn deserialize_width<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = match RawWidth::deserialize(deserializer)? {
        RawWidth::Number(n) => n,
        RawWidth::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("width {:?} is not a number", s)))?,
    };
    let rounded = value.round();
    if !(rounded >= 1.0 && rounded <= u32::MAX as f64) {
        return Err(de::Error::custom(format!("width {} must be at least 1", value)));
    }
    Ok(rounded as u32)
}

fn serialize_width<S: Serializer>(width: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(width)
}

pub fn to_writer<W: Write>(drawing: &Drawing, writer: W) -> serde_json::Result<()> {
    let records: Vec<Record> = drawing
        .segments()
        .iter()
        .map(|segment| Record::Line(segment.into()))
        .collect();
    serde_json::to_writer(writer, &records)
}

/// Parses a saved drawing. Nothing is returned unless every record is valid.
pub fn from_str(contents: &str) -> serde_json::Result<Drawing> {
    let records: Vec<Record> = serde_json::from_str(contents)?;
    let mut skipped = 0;
    let drawing = records
        .into_iter()
        .filter_map(|record| match record {
            Record::Line(line) => Some(Segment::from(line)),
            Record::Other => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        log::warn!("Skipped {} records of unsupported kinds", skipped);
    }
    Ok(drawing)
}

fn temp_sibling(path: &Path) -> io::Result<PathBuf> {
    let mut name: OsString = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
        .to_owned();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

fn write_to<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Writes `path` through a sibling temporary file that is renamed over it
/// once complete, so a failed write leaves the old contents in place.
fn write_replacing<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let temp = temp_sibling(path)?;
    let result = write_to(&temp, write).and_then(|()| std::fs::rename(&temp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    result
}

/// Saves `drawing` to `path`, replacing any existing file.
pub fn save(drawing: &Drawing, path: &Path) -> Result<(), StoreError> {
    write_replacing(path, |writer| Ok(to_writer(drawing, writer)?)).map_err(|source| {
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::info!("Saved {} segments to {}", drawing.len(), path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<Drawing, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let drawing = from_str(&contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Loaded {} segments from {}", drawing.len(), path.display());
    Ok(drawing)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    // Unique name under the system temp directory, removed on drop
    pub(crate) struct TempPath(pub PathBuf);

    impl TempPath {
        pub(crate) fn new(extension: &str) -> Self {
            let name = format!("birdbrush-{}.{}", uuid::Uuid::new_v4(), extension);
            TempPath(std::env::temp_dir().join(name))
        }
    }

    impl Drop for TempPath {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn sample_drawing() -> Drawing {
        vec![
            Segment::new([10, 10, 11, 11], Color::named("red"), 3),
            Segment::new([-4, 700, -3, 701], Color::parse("#00ff7f"), 50),
            Segment::new([10, 10, 11, 11], Color::named("red"), 3),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_record_format() {
        let drawing: Drawing =
            std::iter::once(Segment::new([1, 2, 3, 4], Color::named("blue"), 7)).collect();
        let mut out = Vec::new();
        to_writer(&drawing, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                { "type": "line", "coords": [1, 2, 3, 4], "fill": "blue", "width": "7" }
            ])
        );
    }

    #[test]
    fn test_save_then_load_preserves_segments() {
        let path = TempPath::new(FILE_EXTENSION);
        let drawing = sample_drawing();

        save(&drawing, &path.0).unwrap();
        let loaded = load(&path.0).unwrap();

        assert_eq!(loaded, drawing);
    }

    #[test]
    fn test_loads_legacy_values() {
        let contents = r##"[
            {"type": "line", "coords": [10.0, 10.0, 11.0, 11.0], "fill": "red", "width": "3.0"},
            {"type": "line", "coords": [5, 6, 7, 8], "fill": "#A0B0C0", "width": 2}
        ]"##;
        let drawing = from_str(contents).unwrap();
        assert_eq!(
            drawing.segments(),
            &[
                Segment::new([10, 10, 11, 11], Color::named("red"), 3),
                Segment::new([5, 6, 7, 8], Color::parse("#A0B0C0"), 2),
            ]
        );
    }

    #[test]
    fn test_other_kinds_are_skipped() {
        let contents = r#"[
            {"type": "oval", "coords": [0, 0, 5, 5]},
            {"type": "line", "coords": [1, 1, 2, 2], "fill": "black", "width": "1"}
        ]"#;
        let drawing = from_str(contents).unwrap();
        assert_eq!(drawing.len(), 1);
    }

    #[test]
    fn test_missing_coords_is_an_error() {
        let contents = r#"[{"type": "line", "fill": "red", "width": "3"}]"#;
        assert!(from_str(contents).is_err());
    }

    #[test]
    fn test_malformed_values_are_errors() {
        for contents in [
            "not json",
            r#"{"type": "line"}"#,
            r#"[{"coords": [1, 1, 2, 2], "fill": "red", "width": "3"}]"#,
            r#"[{"type": "line", "coords": [1, 1, 2], "fill": "red", "width": "3"}]"#,
            r#"[{"type": "line", "coords": [1, 1, 2, 2], "fill": "red", "width": "wide"}]"#,
            r#"[{"type": "line", "coords": [1, 1, 2, 2], "fill": "red", "width": "0"}]"#,
            r#"[{"type": "line", "coords": [1e300, 1, 2, 2], "fill": "red", "width": "3"}]"#,
        ] {
            assert!(from_str(contents).is_err(), "accepted {}", contents);
        }
    }

    #[test]
    fn test_load_reports_parse_and_read_errors() {
        let path = TempPath::new(FILE_EXTENSION);
        std::fs::write(&path.0, "[{\"type\": \"line\"}]").unwrap();
        assert!(matches!(load(&path.0), Err(StoreError::Parse { .. })));

        let missing = TempPath::new(FILE_EXTENSION);
        assert!(matches!(load(&missing.0), Err(StoreError::Read { .. })));
    }

    #[test]
    fn test_save_to_unwritable_path() {
        let path = std::env::temp_dir()
            .join(format!("birdbrush-missing-{}", uuid::Uuid::new_v4()))
            .join("drawing.bbf");
        let err = save(&sample_drawing(), &path).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_legacy_fill_text_survives_resave() {
        let contents = r##"[
            {"type": "line", "coords": [1, 1, 2, 2], "fill": "#FF0000", "width": "3"},
            {"type": "line", "coords": [2, 2, 3, 3], "fill": "Red", "width": "3"}
        ]"##;
        let drawing = from_str(contents).unwrap();
        let mut out = Vec::new();
        to_writer(&drawing, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["fill"], "#FF0000");
        assert_eq!(value[1]["fill"], "Red");
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let path = TempPath::new(FILE_EXTENSION);
        std::fs::write(&path.0, "old contents").unwrap();

        save(&sample_drawing(), &path.0).unwrap();

        assert_eq!(load(&path.0).unwrap(), sample_drawing());
        assert!(!temp_sibling(&path.0).unwrap().exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let path = TempPath::new(FILE_EXTENSION);
        std::fs::write(&path.0, "previous drawing").unwrap();

        let result = write_replacing(&path.0, |writer| {
            writer.write_all(b"[{\"type\": \"li")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path.0).unwrap(), "previous drawing");
        assert!(!temp_sibling(&path.0).unwrap().exists());
    }
}
