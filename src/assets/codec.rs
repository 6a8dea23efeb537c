//! Context-string codec for per-asset facts
//!
//! The asset repository keeps one flat string per asset. Uploader, title and
//! co-creators are packed into it as `key=value` segments joined by `|`:
//!
//! ```text
//! studentName=Ada Lovelace|title=Engine|makers=Grace Hopper|Alan Turing
//! ```
//!
//! Keys always appear in this order and only when their value is non-empty.
//! The `makers` value reuses `|` to join names, so after `makers=` every
//! segment without a `=` is one more maker. This only stays unambiguous
//! while no value contains `|` or `=`; [`AssetMetadata::encode`] strips
//! those characters and [`AssetMetadata::try_encode`] rejects them.

use crate::types::{GalleryError, Result};

pub const FIELD_DELIMITER: char = '|';
pub const KEY_SEPARATOR: char = '=';

pub const KEY_UPLOADER: &str = "studentName";
pub const KEY_TITLE: &str = "title";
pub const KEY_MAKERS: &str = "makers";

/// Decoded per-asset facts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Display name of the uploading student; empty when unknown
    pub uploader_name: String,
    pub title: Option<String>,
    /// Co-creators in upload order, exact stored display names
    pub makers: Vec<String>,
}

impl AssetMetadata {
    pub fn new(
        uploader_name: impl Into<String>,
        title: Option<String>,
        makers: Vec<String>,
    ) -> Self {
        Self {
            uploader_name: uploader_name.into(),
            title,
            makers,
        }
    }

    /// Encode, stripping reserved characters from every value.
    ///
    /// A title or maker that is empty after stripping is left out.
    pub fn encode(&self) -> String {
        let uploader = sanitize_value(&self.uploader_name);
        let title = self.title.as_deref().map(sanitize_value);
        let makers: Vec<String> = self.makers.iter().map(|m| sanitize_value(m)).collect();
        join_segments(&uploader, title.as_deref(), &makers)
    }

    /// Encode, failing if any value carries a reserved character
    pub fn try_encode(&self) -> Result<String> {
        let values = std::iter::once(self.uploader_name.as_str())
            .chain(self.title.as_deref())
            .chain(self.makers.iter().map(String::as_str));

        for value in values {
            if contains_reserved(value) {
                return Err(GalleryError::MalformedMetadata(format!(
                    "'{}' contains a reserved character ('{}' or '{}')",
                    value, FIELD_DELIMITER, KEY_SEPARATOR
                )));
            }
        }

        Ok(join_segments(
            self.uploader_name.trim(),
            self.title.as_deref().map(str::trim),
            &self.makers.iter().map(|m| m.trim().to_string()).collect::<Vec<_>>(),
        ))
    }

    /// Decode leniently: anything unrecognised is skipped and missing keys
    /// come back absent.
    pub fn decode(context: &str) -> Self {
        parse(context, false).unwrap_or_default()
    }

    /// Decode, failing on anything [`decode`](Self::decode) would skip
    pub fn try_decode(context: &str) -> Result<Self> {
        parse(context, true)
    }

    /// Same facts with the title replaced
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

/// Encode the fact triple into a context string
pub fn encode(uploader_name: &str, title: Option<&str>, makers: &[String]) -> String {
    AssetMetadata::new(uploader_name, title.map(str::to_string), makers.to_vec()).encode()
}

/// Decode a context string; never fails
pub fn decode(context: &str) -> AssetMetadata {
    AssetMetadata::decode(context)
}

/// Replace only the title inside an existing context string.
///
/// Uploader and makers are carried over from `context` untouched.
pub fn retitle(context: &str, title: &str) -> String {
    let title = sanitize_value(title);
    let title = if title.is_empty() { None } else { Some(title) };
    AssetMetadata::decode(context).with_title(title).encode()
}

/// Whether `value` holds a character the encoding reserves
pub fn contains_reserved(value: &str) -> bool {
    value.contains(FIELD_DELIMITER) || value.contains(KEY_SEPARATOR)
}

/// Remove reserved characters and surrounding whitespace
pub fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != FIELD_DELIMITER && *c != KEY_SEPARATOR)
        .collect::<String>()
        .trim()
        .to_string()
}

fn join_segments(uploader: &str, title: Option<&str>, makers: &[String]) -> String {
    let mut segments = Vec::with_capacity(3);

    if !uploader.is_empty() {
        segments.push(format!("{KEY_UPLOADER}{KEY_SEPARATOR}{uploader}"));
    }
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        segments.push(format!("{KEY_TITLE}{KEY_SEPARATOR}{title}"));
    }

    let makers: Vec<&str> = makers
        .iter()
        .map(String::as_str)
        .filter(|m| !m.is_empty())
        .collect();
    if !makers.is_empty() {
        segments.push(format!(
            "{KEY_MAKERS}{KEY_SEPARATOR}{}",
            makers.join(&FIELD_DELIMITER.to_string())
        ));
    }

    segments.join(&FIELD_DELIMITER.to_string())
}

fn parse(context: &str, strict: bool) -> Result<AssetMetadata> {
    let mut metadata = AssetMetadata::default();
    let mut in_makers = false;

    for segment in context.split(FIELD_DELIMITER) {
        match segment.split_once(KEY_SEPARATOR) {
            Some((key, value)) => {
                in_makers = key == KEY_MAKERS;
                match key {
                    KEY_UPLOADER => metadata.uploader_name = value.to_string(),
                    KEY_TITLE => {
                        metadata.title = (!value.is_empty()).then(|| value.to_string())
                    }
                    KEY_MAKERS => {
                        if !value.is_empty() {
                            metadata.makers.push(value.to_string());
                        }
                    }
                    _ if strict => {
                        return Err(GalleryError::MalformedMetadata(format!(
                            "unknown key '{}'",
                            key
                        )))
                    }
                    _ => {}
                }
            }
            None if in_makers => {
                if !segment.is_empty() {
                    metadata.makers.push(segment.to_string());
                }
            }
            None if strict && !segment.is_empty() => {
                return Err(GalleryError::MalformedMetadata(format!(
                    "segment '{}' has no key",
                    segment
                )))
            }
            None => {}
        }
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_layout() {
        assert_eq!(
            encode("Ada Lovelace", Some("Engine"), &names(&["Grace Hopper", "Alan Turing"])),
            "studentName=Ada Lovelace|title=Engine|makers=Grace Hopper|Alan Turing"
        );
        assert_eq!(encode("Ada Lovelace", None, &[]), "studentName=Ada Lovelace");
        assert_eq!(encode("Ada Lovelace", Some(""), &[]), "studentName=Ada Lovelace");
        assert_eq!(
            encode("Ada Lovelace", None, &names(&["Grace Hopper"])),
            "studentName=Ada Lovelace|makers=Grace Hopper"
        );
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            AssetMetadata::new("Ada Lovelace", Some("Engine".into()), names(&["Grace Hopper"])),
            AssetMetadata::new("Ayşe Yılmaz", None, names(&["Çağrı Öztürk", "İpek Güneş"])),
            AssetMetadata::new("John Smith", Some("A title, with: punctuation!".into()), vec![]),
            AssetMetadata::new("John Smith", None, vec![]),
        ];

        for case in cases {
            assert_eq!(decode(&case.encode()), case);
            assert_eq!(AssetMetadata::try_decode(&case.try_encode().unwrap()).unwrap(), case);
        }
    }

    #[test]
    fn test_retitle_keeps_uploader_and_makers() {
        let updated = retitle("studentName=Ada Lovelace|title=Old|makers=Grace Hopper", "New");
        assert_eq!(updated, "studentName=Ada Lovelace|title=New|makers=Grace Hopper");

        let added = retitle("studentName=Ada Lovelace|makers=Grace Hopper|Alan Turing", "First");
        assert_eq!(
            added,
            "studentName=Ada Lovelace|title=First|makers=Grace Hopper|Alan Turing"
        );
    }

    #[test]
    fn test_reserved_characters_are_stripped() {
        let meta = AssetMetadata::new("Ada Lovelace", Some("a|b=c".into()), names(&["Grace|Hopper"]));
        let encoded = meta.encode();
        assert_eq!(encoded, "studentName=Ada Lovelace|title=abc|makers=GraceHopper");

        let decoded = decode(&encoded);
        assert_eq!(decoded.title.as_deref(), Some("abc"));
        assert_eq!(decoded.makers, names(&["GraceHopper"]));

        assert_eq!(retitle("studentName=Ada Lovelace", "x=1|y"), "studentName=Ada Lovelace|title=x1y");
    }

    #[test]
    fn test_title_made_only_of_reserved_characters_is_absent() {
        let meta = AssetMetadata::new("Ada Lovelace", Some("|=|".into()), vec![]);
        assert_eq!(meta.encode(), "studentName=Ada Lovelace");
    }

    #[test]
    fn test_try_encode_rejects_reserved_characters() {
        let meta = AssetMetadata::new("Ada Lovelace", Some("a|b".into()), vec![]);
        assert!(matches!(meta.try_encode(), Err(GalleryError::MalformedMetadata(_))));

        let meta = AssetMetadata::new("Ada Lovelace", None, names(&["Grace=Hopper"]));
        assert!(meta.try_encode().is_err());
    }

    #[test]
    fn test_decode_missing_fields() {
        assert_eq!(decode(""), AssetMetadata::default());

        let only_title = decode("title=Bridge");
        assert_eq!(only_title.uploader_name, "");
        assert_eq!(only_title.title.as_deref(), Some("Bridge"));
        assert!(only_title.makers.is_empty());
    }

    #[test]
    fn test_decode_corrupt_context_degrades() {
        let decoded = decode("garbage|studentName=Ada Lovelace|colour=red|title=");
        assert_eq!(decoded.uploader_name, "Ada Lovelace");
        assert_eq!(decoded.title, None);
        assert!(decoded.makers.is_empty());

        assert!(AssetMetadata::try_decode("garbage|studentName=Ada Lovelace").is_err());
        assert!(AssetMetadata::try_decode("studentName=Ada Lovelace|colour=red").is_err());
    }

    #[test]
    fn test_makers_must_trail() {
        // A bare segment only counts as a maker while inside `makers=`
        let decoded = decode("studentName=Ada Lovelace|makers=Grace Hopper|Alan Turing|title=T");
        assert_eq!(decoded.makers, names(&["Grace Hopper", "Alan Turing"]));
        assert_eq!(decoded.title.as_deref(), Some("T"));
    }
}
