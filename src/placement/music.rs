//! Music library layout: `<Letter>/<Artist>/<Album>/<Disc-Track> <Title>.<ext>`.

use std::path::{Path, PathBuf};

use crate::error::{ItemError, ItemResult};
use crate::sanitize::{segment, UNKNOWN};
use crate::tags::TagSet;

use super::Placement;

/// Tags requested for every music file.
pub const TAGS: [&str; 9] = [
    "Artist",
    "Band",
    "Album",
    "Title",
    "Track",
    "TrackNumber",
    "PartOfSet",
    "DiscNumber",
    "Compilation",
];

/// Directory label used for compilation albums without a band tag.
const COMPILATION: &str = "Compilation";

/// Index letter for artists without any alphanumeric character.
const NO_LETTER: &str = "#";

#[derive(Debug, Clone, Copy, Default)]
pub struct MusicRules;

impl MusicRules {
    pub fn place(&self, path: &Path, tags: &TagSet) -> ItemResult<Placement> {
        Ok(Placement {
            directory: directory(tags),
            filename: filename(path, tags)?,
        })
    }
}

/// The artist a file is filed under.
///
/// Band (album artist) wins over the compilation flag, which wins over the
/// track artist.
pub fn artist(tags: &TagSet) -> &str {
    if let Some(band) = tags.get("Band") {
        band
    } else if matches!(tags.get("Compilation"), Some("1") | Some("Yes")) {
        COMPILATION
    } else {
        tags.get("Artist").unwrap_or(UNKNOWN)
    }
}

/// First letter used to bucket an artist, ignoring any "the".
pub fn index_letter(artist: &str) -> String {
    artist
        .to_lowercase()
        .replace("the", "")
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| NO_LETTER.to_string())
}

pub fn directory(tags: &TagSet) -> PathBuf {
    let artist = artist(tags);
    PathBuf::from(index_letter(artist))
        .join(segment(Some(artist)))
        .join(segment(tags.get("Album")))
}

/// Track number, zero padded and disc qualified for multi-disc sets.
pub fn track_field(tags: &TagSet) -> ItemResult<String> {
    let track = tags
        .get("Track")
        .map(str::to_string)
        .or_else(|| tags.get("TrackNumber").map(|t| t.replace(" of ", "/")));

    let Some(track) = track else {
        return Ok("00".to_string());
    };

    let number = track.split('/').next().unwrap_or_default().trim();
    let number = format!("{:0>2}", number);

    match disc_prefix(tags)? {
        Some(disc) => Ok(format!("{}-{}", disc, number)),
        None => Ok(number),
    }
}

/// Disc number to prefix, if the file belongs to a real multi-disc set.
///
/// `"2"` and `"2/3"` qualify; `"1"`, `"1/1"`, `"1/2"` and `"2/1"` do not.
fn disc_prefix(tags: &TagSet) -> ItemResult<Option<u32>> {
    let (tag, value) = match (tags.get("PartOfSet"), tags.get("DiscNumber")) {
        (Some(part), _) => ("PartOfSet", part.to_string()),
        (None, Some(disc)) => ("DiscNumber", disc.replace(" of ", "/")),
        (None, None) => return Ok(None),
    };

    let parts = value
        .split('/')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u32>().map_err(|_| ItemError::MalformedTag {
                tag,
                value: value.clone(),
            })
        })
        .take(2)
        .collect::<ItemResult<Vec<u32>>>()?;

    let prefix = match parts.as_slice() {
        [disc] if *disc > 1 => Some(*disc),
        [disc, total] if *disc > 1 && *total > 1 => Some(*disc),
        _ => None,
    };
    Ok(prefix)
}

pub fn filename(path: &Path, tags: &TagSet) -> ItemResult<String> {
    let track = track_field(tags)?;
    let title = segment(tags.get("Title"));
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    Ok(format!("{} {}{}", track, title, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags(pairs: &[(&'static str, &str)]) -> TagSet {
        let mut set = TagSet::absent(&TAGS);
        for (name, value) in pairs {
            set.set(name, Some(value.to_string()));
        }
        set
    }

    #[test]
    fn test_band_with_trailing_article() {
        let tags = tags(&[
            ("Band", "Beatles, The"),
            ("Album", "Abbey Road"),
            ("Title", "Come Together"),
            ("Track", "1/17"),
        ]);
        let placement = MusicRules.place(Path::new("/in/track01.MP3"), &tags).unwrap();

        assert_eq!(placement.directory, PathBuf::from("B/Beatles The/Abbey Road"));
        assert_eq!(placement.filename, "01 Come Together.mp3");
    }

    #[test]
    fn test_compilation_without_band() {
        let tags = tags(&[
            ("Compilation", "1"),
            ("Artist", "Various"),
            ("Album", "Now 80"),
            ("Title", "Song"),
        ]);
        assert_eq!(directory(&tags), PathBuf::from("C/Compilation/Now 80"));
    }

    #[test]
    fn test_band_beats_compilation_flag() {
        let tags = tags(&[("Band", "Queen"), ("Compilation", "Yes")]);
        assert_eq!(artist(&tags), "Queen");
    }

    #[test]
    fn test_everything_missing() {
        let tags = TagSet::absent(&TAGS);
        let placement = MusicRules.place(Path::new("song.m4a"), &tags).unwrap();
        assert_eq!(placement.directory, PathBuf::from("U/Unknown/Unknown"));
        assert_eq!(placement.filename, "00 Unknown.m4a");
    }

    #[rstest]
    #[case("The Who", "W")]
    #[case("Beatles, The", "B")]
    #[case("The The", "#")]
    #[case("!!!", "#")]
    #[case("ätna", "Ä")]
    #[case("2Pac", "2")]
    #[case("Theatre of Tragedy", "A")]
    fn test_index_letter(#[case] artist: &str, #[case] expected: &str) {
        assert_eq!(index_letter(artist), expected);
    }

    #[rstest]
    #[case(&[("Track", "5/12"), ("PartOfSet", "2/2")], "2-05")]
    #[case(&[("Track", "5/12"), ("PartOfSet", "1/1")], "05")]
    #[case(&[("Track", "5/12"), ("PartOfSet", "1/2")], "05")]
    #[case(&[("Track", "5/12"), ("PartOfSet", "2/1")], "05")]
    #[case(&[("Track", "5"), ("PartOfSet", "3")], "3-05")]
    #[case(&[("Track", "5"), ("PartOfSet", "1")], "05")]
    #[case(&[("Track", "5"), ("PartOfSet", "2/")], "2-05")]
    #[case(&[("Track", "12"), ("DiscNumber", "2 of 3")], "2-12")]
    #[case(&[("TrackNumber", "7 of 10")], "07")]
    #[case(&[("Track", "")], "00")]
    #[case(&[("PartOfSet", "2/2")], "00")]
    #[case(&[], "00")]
    fn test_track_field(#[case] pairs: &[(&'static str, &str)], #[case] expected: &str) {
        assert_eq!(track_field(&tags(pairs)).unwrap(), expected);
    }

    #[test]
    fn test_malformed_disc_fails() {
        let err = track_field(&tags(&[("Track", "1"), ("PartOfSet", "A/2")])).unwrap_err();
        assert!(matches!(err, ItemError::MalformedTag { tag: "PartOfSet", .. }));
    }

    #[test]
    fn test_missing_title_falls_back() {
        let name = filename(Path::new("x.mp3"), &tags(&[("Track", "3")])).unwrap();
        assert_eq!(name, "03 Unknown.mp3");
    }

    #[test]
    fn test_title_is_sanitized() {
        let name = filename(
            Path::new("x.Mp3"),
            &tags(&[("Track", "9"), ("Title", "What's/Going On?")]),
        )
        .unwrap();
        assert_eq!(name, "09 WhatsGoing On.mp3");
    }
}
