use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{TagReader, TagSet};

/// EXIF fields consulted for `CreateDate`, in order of preference.
const DATE_FIELDS: [exif::Tag; 3] = [
    exif::Tag::DateTimeOriginal,
    exif::Tag::DateTimeDigitized,
    exif::Tag::DateTime,
];

/// Reads the capture date straight from a file's EXIF block.
///
/// Only understands `CreateDate`; every other requested tag is reported
/// absent. Used for photo runs when exiftool is not installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl TagReader for ExifReader {
    fn extract_tags(&self, path: &Path, names: &[&'static str]) -> TagSet {
        let mut tags = TagSet::absent(names);
        if names.contains(&"CreateDate") {
            tags.set("CreateDate", read_create_date(path));
        }
        tags
    }
}

fn read_create_date(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut bufreader)
        .ok()?;

    DATE_FIELDS.iter().find_map(|tag| {
        let field = exif.get_field(*tag, exif::In::PRIMARY)?;
        match field.value {
            exif::Value::Ascii(ref parts) => parts
                .first()
                .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    })
}
