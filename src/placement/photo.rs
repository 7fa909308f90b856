//! Photo library layout.
//!
//! Default: `<Year>/<MM> <Month name>/<YYYY-MM-DD>_<original name>`.
//! Keywords written upstream steer the grouping:
//!
//! - `album:<name>` replaces the month name (a leading `YYYY - ` is dropped),
//! - `parent:<name>` replaces the year directory,
//! - `hazel:no month` drops the `MM ` prefix from the album directory.
//!
//! ```text
//! 2015/09 September/2015-09-28_Birthday.jpg
//! 2015/09 My Birthday/2015-09-28_Birthday.jpg
//! Birthdays/My Birthday/2015-09-28_Birthday.jpg
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Local, NaiveDateTime};
use regex::Regex;

use crate::error::{ItemError, ItemResult};
use crate::sanitize::segment;
use crate::tags::TagSet;

use super::Placement;

/// Tags requested for every photo.
pub const TAGS: [&str; 2] = ["CreateDate", "Keywords"];

const PARENT_PREFIX: &str = "parent:";
const ALBUM_PREFIX: &str = "album:";
const NO_MONTH: &str = "hazel:no month";

/// EXIF date layout as printed by exiftool.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const EXIF_DATE_LEN: usize = 19;

static YEAR_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4} - ").unwrap());
static DATED_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}_").unwrap());

pub const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Photo metadata after resolving the raw tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoTags {
    pub created: NaiveDateTime,
    pub keywords: Vec<String>,
}

impl PhotoTags {
    /// Resolve the creation date and keyword list of `path`.
    ///
    /// Without a CreateDate tag the file's creation time (or modification
    /// time where creation time is unsupported) is used instead. An all-zero
    /// date counts as absent.
    pub fn resolve(path: &Path, tags: &TagSet) -> ItemResult<Self> {
        let created = match tags.get("CreateDate").filter(|v| !is_unset_date(v)) {
            Some(value) => parse_create_date(value)?,
            None => filesystem_date(path)?,
        };
        let keywords = tags.get("Keywords").map(split_keywords).unwrap_or_default();

        Ok(Self { created, keywords })
    }

    fn keyword_value(&self, prefix: &str) -> Option<&str> {
        self.keywords.iter().find_map(|k| k.strip_prefix(prefix))
    }

    fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

pub fn parse_create_date(value: &str) -> ItemResult<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, EXIF_DATE_FORMAT)
        .or_else(|e| match value.get(..EXIF_DATE_LEN) {
            Some(head) => NaiveDateTime::parse_from_str(head, EXIF_DATE_FORMAT),
            None => Err(e),
        })
        .map_err(|_| ItemError::MalformedDate(value.to_string()))
}

/// exiftool prints `0000:00:00 00:00:00` for a date field that was never set.
fn is_unset_date(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value.chars().any(|c| c == '0')
        && value.chars().all(|c| matches!(c, '0' | ':' | ' '))
}

fn filesystem_date(path: &Path) -> ItemResult<NaiveDateTime> {
    let metadata = fs::metadata(path).map_err(|e| ItemError::io("read metadata of", path, e))?;
    let time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_err(|e| ItemError::io("read timestamps of", path, e))?;
    Ok(DateTime::<Local>::from(time).naive_local())
}

fn split_keywords(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct PhotoRules {
    month_names: [String; 12],
}

impl Default for PhotoRules {
    fn default() -> Self {
        Self {
            month_names: ENGLISH_MONTHS.map(str::to_string),
        }
    }
}

impl PhotoRules {
    /// Rules using custom month names, January first.
    ///
    /// Returns `None` unless exactly twelve names are given.
    pub fn with_month_names(names: &[String]) -> Option<Self> {
        let month_names: [String; 12] = names.to_vec().try_into().ok()?;
        Some(Self { month_names })
    }

    pub fn place(&self, path: &Path, tags: &TagSet) -> ItemResult<Placement> {
        let photo = PhotoTags::resolve(path, tags)?;
        Ok(Placement {
            directory: self.directory(&photo),
            filename: filename(path, &photo),
        })
    }

    pub fn directory(&self, photo: &PhotoTags) -> PathBuf {
        let parent = photo
            .keyword_value(PARENT_PREFIX)
            .map(str::to_string)
            .unwrap_or_else(|| photo.created.format("%Y").to_string());

        let mut album = match photo.keyword_value(ALBUM_PREFIX) {
            Some(album) => YEAR_PREFIX.replace(album, "").into_owned(),
            None => self.month_name(photo.created.month0()).to_string(),
        };

        if !photo.has_keyword(NO_MONTH) {
            album = format!("{:02} {}", photo.created.month(), album);
        }

        PathBuf::from(segment(Some(&parent))).join(segment(Some(&album)))
    }

    fn month_name(&self, month0: u32) -> &str {
        &self.month_names[month0 as usize % 12]
    }
}

/// Prefix the file name with the capture date unless it already carries one.
pub fn filename(path: &Path, photo: &PhotoTags) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if DATED_NAME.is_match(&name) {
        name
    } else {
        format!("{}_{}", photo.created.format("%Y-%m-%d"), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn photo(date: &str, keywords: &[&str]) -> PhotoTags {
        PhotoTags {
            created: parse_create_date(date).unwrap(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_layout() {
        let photo = photo("2015:09:28 14:00:00", &[]);
        let rules = PhotoRules::default();
        assert_eq!(rules.directory(&photo), PathBuf::from("2015/09 September"));
        assert_eq!(
            filename(Path::new("/in/Birthday.jpg"), &photo),
            "2015-09-28_Birthday.jpg"
        );
    }

    #[test]
    fn test_album_keyword() {
        let photo = photo("2015:09:28 14:00:00", &["album:My Birthday"]);
        assert_eq!(
            PhotoRules::default().directory(&photo),
            PathBuf::from("2015/09 My Birthday")
        );
    }

    #[test]
    fn test_parent_album_and_no_month() {
        let photo = photo(
            "2015:09:28 14:00:00",
            &["parent:Birthdays", "album:2015 - My Birthday", "hazel:no month"],
        );
        assert_eq!(
            PhotoRules::default().directory(&photo),
            PathBuf::from("Birthdays/My Birthday")
        );
    }

    #[test]
    fn test_first_matching_keyword_wins() {
        let photo = photo("2020:01:02 03:04:05", &["album:First", "album:Second"]);
        assert_eq!(
            PhotoRules::default().directory(&photo),
            PathBuf::from("2020/01 First")
        );
    }

    #[test]
    fn test_keywords_are_split_and_trimmed() {
        let tags = TagSet::from_pairs([
            ("CreateDate", Some("2015:09:28 14:00:00")),
            ("Keywords", Some("family,  album:Trip , hazel:no month")),
        ]);
        let photo = PhotoTags::resolve(Path::new("a.jpg"), &tags).unwrap();
        assert_eq!(photo.keywords, ["family", "album:Trip", "hazel:no month"]);
        assert_eq!(
            PhotoRules::default().directory(&photo),
            PathBuf::from("2015/Trip")
        );
    }

    #[test]
    fn test_dated_name_is_kept() {
        let photo = photo("2015:09:28 14:00:00", &[]);
        assert_eq!(
            filename(Path::new("2014-01-01_Old.jpg"), &photo),
            "2014-01-01_Old.jpg"
        );
    }

    #[test]
    fn test_date_with_suffix() {
        let parsed = parse_create_date("2015:09:28 14:00:00+02:00").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2015-09-28 14:00");
    }

    #[test]
    fn test_malformed_date_fails() {
        let err = parse_create_date("yesterday").unwrap_err();
        assert!(matches!(err, ItemError::MalformedDate(_)));
    }

    #[test]
    fn test_filesystem_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.png");
        File::create(&path).unwrap();

        let tags = TagSet::absent(&TAGS);
        let resolved = PhotoTags::resolve(&path, &tags).unwrap();
        let today = Local::now().naive_local().date();
        assert!((today - resolved.created.date()).num_days().abs() <= 1);
        assert!(resolved.keywords.is_empty());
    }

    #[test]
    fn test_unset_date_falls_back_to_filesystem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mov");
        File::create(&path).unwrap();

        let tags = TagSet::from_pairs([("CreateDate", Some("0000:00:00 00:00:00")), ("Keywords", None)]);
        let resolved = PhotoTags::resolve(&path, &tags).unwrap();
        assert!(resolved.created.year() > 1970);
    }

    #[test]
    fn test_non_ascii_digits_are_not_a_date_prefix() {
        let plain = photo("2015:09:28 14:00:00", &[]);
        assert_eq!(
            filename(Path::new("٢٠١٤-٠١-٠١_Old.jpg"), &plain),
            "2015-09-28_٢٠١٤-٠١-٠١_Old.jpg"
        );

        let album = photo("2015:09:28 14:00:00", &["album:٢٠١٥ - Trip"]);
        assert_eq!(
            PhotoRules::default().directory(&album),
            PathBuf::from("2015/09 ٢٠١٥ Trip")
        );
    }

    #[test]
    fn test_missing_file_without_date_fails() {
        let tags = TagSet::absent(&TAGS);
        let err = PhotoTags::resolve(Path::new("/nonexistent/x.jpg"), &tags).unwrap_err();
        assert!(matches!(err, ItemError::Io { .. }));
    }

    #[test]
    fn test_custom_month_names() {
        let names: Vec<String> = [
            "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
            "Oktober", "November", "Dezember",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let rules = PhotoRules::with_month_names(&names).unwrap();
        let photo = photo("2016:03:01 10:00:00", &[]);
        assert_eq!(rules.directory(&photo), PathBuf::from("2016/03 März"));

        assert!(PhotoRules::with_month_names(&names[..11]).is_none());
    }
}
