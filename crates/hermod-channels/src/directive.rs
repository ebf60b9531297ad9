//! Relay infile line grammar.
//!
//! A line is either free text, sent as-is, or an attachment directive:
//!
//! ```text
//! FILE!<KIND>!<ORIGIN>!<PATH> <caption words...>
//! ```
//!
//! `KIND` is a media tag (`PIC`, `DOC`, ...), `ORIGIN` names the bridge that
//! wrote the line (`TEL`, `SIG`, ...) and picks the base URL used when the
//! upload fails and a link is sent instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Leading field of an attachment directive.
pub const DIRECTIVE_MARKER: &str = "FILE";

/// Separator between the directive header fields.
pub const FIELD_SEPARATOR: char = '!';

/// Why a directive line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("too few parts in FILE line")]
    TooFewParts,
    #[error("FILE header has {0} fields, expected at least 4")]
    MalformedHeader(usize),
}

/// A parsed attachment directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDirective {
    pub kind: String,
    pub origin: String,
    pub path: PathBuf,
    pub caption: String,
}

impl AttachmentDirective {
    /// Plain text sent when the upload fails.
    ///
    /// Links to the file under the origin's base URL when one is configured,
    /// otherwise names the media kind.
    pub fn fallback_text(&self, link_origins: &BTreeMap<String, String>) -> String {
        let base_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        match (link_origins.get(&self.origin), base_name) {
            (Some(base), Some(name)) => format!(
                "{} ( {}/{} )",
                self.caption,
                base.trim_end_matches('/'),
                name
            ),
            _ => format!("{} [{}]", self.caption, self.kind),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One line of the relay infile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayLine {
    Empty,
    Text(String),
    Attachment(AttachmentDirective),
}

/// Classify and parse a line.
pub fn parse_line(line: &str) -> Result<RelayLine, DirectiveError> {
    if line.trim().is_empty() {
        return Ok(RelayLine::Empty);
    }
    if !is_directive(line) {
        return Ok(RelayLine::Text(line.to_string()));
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(DirectiveError::TooFewParts);
    }
    let header: Vec<&str> = parts[0].split(FIELD_SEPARATOR).collect();
    if header.len() < 4 {
        return Err(DirectiveError::MalformedHeader(header.len()));
    }

    Ok(RelayLine::Attachment(AttachmentDirective {
        kind: header[1].to_string(),
        origin: header[2].to_string(),
        path: Path::new(header[3]).to_path_buf(),
        caption: parts[1..].join(" "),
    }))
}

fn is_directive(line: &str) -> bool {
    line.strip_prefix(DIRECTIVE_MARKER)
        .is_some_and(|rest| rest.starts_with(FIELD_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(line: &str) -> AttachmentDirective {
        match parse_line(line).unwrap() {
            RelayLine::Attachment(a) => a,
            other => panic!("expected attachment, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            parse_line("hello world").unwrap(),
            RelayLine::Text("hello world".to_string())
        );
        assert_eq!(
            parse_line("FILES are great").unwrap(),
            RelayLine::Text("FILES are great".to_string())
        );
    }

    #[test]
    fn test_empty_lines() {
        assert_eq!(parse_line("").unwrap(), RelayLine::Empty);
        assert_eq!(parse_line("   ").unwrap(), RelayLine::Empty);
    }

    #[test]
    fn test_directive_fields() {
        let a = attachment("FILE!PIC!TEL!/srv/media/cat.jpg look at   this");
        assert_eq!(a.kind, "PIC");
        assert_eq!(a.origin, "TEL");
        assert_eq!(a.path, PathBuf::from("/srv/media/cat.jpg"));
        assert_eq!(a.caption, "look at this");
        assert_eq!(a.file_name(), "cat.jpg");
    }

    #[test]
    fn test_extra_header_fields_are_ignored() {
        let a = attachment("FILE!PIC!TEL!path!caption here");
        assert_eq!(a.path, PathBuf::from("path"));
        assert_eq!(a.caption, "here");
    }

    #[test]
    fn test_directive_without_caption_is_rejected() {
        assert_eq!(
            parse_line("FILE!PIC!TEL!/tmp/x.jpg"),
            Err(DirectiveError::TooFewParts)
        );
    }

    #[test]
    fn test_short_header_is_rejected() {
        assert_eq!(
            parse_line("FILE!PIC!/tmp/x.jpg caption"),
            Err(DirectiveError::MalformedHeader(3))
        );
    }

    #[test]
    fn test_fallback_with_link_origin() {
        let origins = BTreeMap::from([(
            "TEL".to_string(),
            "http://example.org/telegram/".to_string(),
        )]);
        let a = attachment("FILE!PIC!TEL!/srv/media/cat.jpg a cat");
        assert_eq!(
            a.fallback_text(&origins),
            "a cat ( http://example.org/telegram/cat.jpg )"
        );
    }

    #[test]
    fn test_fallback_without_link_origin() {
        let a = attachment("FILE!DOC!IRC!/srv/media/notes.pdf the notes");
        assert_eq!(a.fallback_text(&BTreeMap::new()), "the notes [DOC]");
    }
}
