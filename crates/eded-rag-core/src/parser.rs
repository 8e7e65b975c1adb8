//! Section record parser.
//!
//! The source document is a flat text file whose entries are separated by
//! lines of ten or more dashes. Text before the first delimiter is the
//! introduction. Each following section describes one data element:
//!
//! ```text
//! ----------------------------------------------------------------------
//! 1001  Document name code                                          [C]
//!
//!      Desc: Code specifying the document name.
//!
//!      Repr: an..3
//!
//!      Note:
//!      1 Use UN/EDIFACT code list 1001.
//! ```
//!
//! # State machine
//!
//! Lines of a section are consumed by a cursor in one of three states:
//!
//! ```text
//! ExpectId ──(leading digits)──▶ FieldsAny ──(Note:)──▶ NoteCapture
//!     │                                                     ▲
//!     └────────────────────────(Note:)──────────────────────┘
//! ```
//!
//! * `ExpectId`: the first line starting with digits sets the id, the
//!   optional trailing usage token, and the name.
//! * `FieldsAny`: `Desc:` and `Repr:` lines set their fields; the value is
//!   the text after the first colon. `Desc:`/`Repr:` are also honoured in
//!   `ExpectId`.
//! * `NoteCapture`: terminal. Every remaining line of the section becomes
//!   part of the note, including lines that carry `Desc:` or `Repr:`.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{EdedError, Result};
use crate::models::{ParsedDocument, Record};
use crate::representation::{self, TypeTag};
use crate::usage::UsageCode;

static DELIMITER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^-{10,}").unwrap());
static ID_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]+)(.*)$").unwrap());
static USAGE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[A-Z]\]$").unwrap());
static ENUMERATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]\s+").unwrap());

const DESC_MARKER: &str = "Desc:";
const REPR_MARKER: &str = "Repr:";
const NOTE_MARKER: &str = "Note:";

/// What to do with a section that has content but no numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Fail the whole parse with [`EdedError::Parse`].
    #[default]
    Abort,
    /// Log a warning and leave the section out.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectId,
    FieldsAny,
    NoteCapture,
}

#[derive(Debug, Default)]
struct SectionFields {
    id: Option<String>,
    name: String,
    description: String,
    /// `None` until a `Repr:` line is seen; an empty value still decodes.
    representation: Option<String>,
    note: Option<String>,
    usage_code: Option<UsageCode>,
}

impl SectionFields {
    fn into_record(self, id: String) -> Record {
        let (representation_description, representation_type, representation_max_length) =
            match &self.representation {
                Some(spec) => {
                    let decoded = representation::decode(spec);
                    (decoded.phrase, decoded.type_tag, decoded.max_length)
                }
                None => (String::new(), TypeTag::Unknown, None),
            };

        Record {
            id,
            name: self.name,
            description: self.description,
            representation: self.representation.unwrap_or_default(),
            representation_description,
            representation_type,
            representation_max_length,
            note: self.note,
            usage_code: self.usage_code,
        }
    }
}

/// Split a document into its introduction and raw section bodies.
pub fn split_sections(text: &str) -> (&str, Vec<&str>) {
    let mut parts = DELIMITER.split(text);
    let introduction = parts.next().unwrap_or_default();
    (introduction, parts.collect())
}

/// Parse a whole document into its introduction and ordered records.
///
/// Sections without any non-blank line (for example after a trailing
/// delimiter) are not entries and are ignored. Sections with content but
/// no id are handled according to `policy`.
///
/// Parsing is a pure function of `text`: the same input always yields the
/// same records in the same order.
pub fn parse_document(text: &str, policy: MalformedPolicy) -> Result<ParsedDocument> {
    let (introduction, sections) = split_sections(text);
    let mut records = Vec::with_capacity(sections.len());

    for (index, section) in sections.iter().enumerate() {
        let number = index + 1;
        match parse_section(section, number) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => debug!(section = number, "skipping blank section"),
            Err(err @ EdedError::Parse { .. }) if policy == MalformedPolicy::Skip => {
                warn!(section = number, "{}", err);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(ParsedDocument {
        introduction: introduction.trim().to_string(),
        records,
    })
}

/// Parse one section body. `number` is the 1-based section index used in
/// error messages.
///
/// Returns `Ok(None)` for a section with no non-blank lines.
pub fn parse_section(section: &str, number: usize) -> Result<Option<Record>> {
    let lines: Vec<&str> = section
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let Some(first_line) = lines.first() else {
        return Ok(None);
    };

    let mut state = State::ExpectId;
    let mut fields = SectionFields::default();

    for line in &lines {
        match state {
            State::NoteCapture => append_note_line(&mut fields, line),
            State::ExpectId => {
                if let Some(caps) = ID_LINE.captures(line) {
                    fields.id = Some(caps[1].to_string());
                    read_name(&mut fields, caps[2].trim())?;
                    state = State::FieldsAny;
                } else {
                    state = read_markers(&mut fields, line, state);
                }
            }
            State::FieldsAny => {
                state = read_markers(&mut fields, line, state);
            }
        }
    }

    match fields.id.take() {
        Some(id) => Ok(Some(fields.into_record(id))),
        None => Err(EdedError::Parse {
            section: number,
            message: format!("no numeric id found (first line: {:?})", first_line),
        }),
    }
}

/// Split the remainder of an id line into name and optional usage token.
fn read_name(fields: &mut SectionFields, rest: &str) -> Result<()> {
    match USAGE_SUFFIX.find(rest) {
        Some(token) => {
            fields.usage_code = Some(UsageCode::lookup(token.as_str())?);
            fields.name = rest[..token.start()].trim().to_string();
        }
        None => fields.name = rest.to_string(),
    }
    Ok(())
}

/// Apply `Desc:`/`Repr:` markers and return the next state.
fn read_markers(fields: &mut SectionFields, line: &str, state: State) -> State {
    if line.contains(DESC_MARKER) {
        fields.description = after_first_colon(line);
    }
    if line.contains(REPR_MARKER) {
        fields.representation = Some(after_first_colon(line));
    }
    if line.contains(NOTE_MARKER) {
        fields.note = Some(String::new());
        return State::NoteCapture;
    }
    state
}

fn append_note_line(fields: &mut SectionFields, line: &str) {
    let text = ENUMERATION.replace(line, "");
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let note = fields.note.get_or_insert_with(String::new);
    if !note.is_empty() {
        note.push(' ');
    }
    note.push_str(text);
}

fn after_first_colon(line: &str) -> String {
    line.split_once(':')
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELIM: &str = "----------------------------------------";

    fn doc(sections: &[&str]) -> String {
        let mut text = String::from("UN/EDIFACT data element directory\nIntroduction text.\n");
        for s in sections {
            text.push_str(DELIM);
            text.push('\n');
            text.push_str(s);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_sample_section() {
        let text = doc(&["100 Sample Name [C]\nDesc: A thing.\nRepr: an..10\nNote:\n1 extra detail"]);
        let parsed = parse_document(&text, MalformedPolicy::Abort).unwrap();
        assert_eq!(parsed.records.len(), 1);
        let rec = &parsed.records[0];
        assert_eq!(rec.id, "100");
        assert_eq!(rec.name, "Sample Name");
        assert_eq!(rec.usage_code, Some(UsageCode::Common));
        assert_eq!(rec.description, "A thing.");
        assert_eq!(rec.representation, "an..10");
        assert!(rec
            .representation_description
            .contains("Up to 10 alphanumeric characters"));
        assert_eq!(rec.representation_type, TypeTag::Alphanumeric);
        assert_eq!(rec.representation_max_length, Some(10));
        assert_eq!(rec.note.as_deref(), Some("extra detail"));
    }

    #[test]
    fn test_introduction_excluded() {
        let text = doc(&["1001 Document name code\nDesc: Code.\nRepr: an..3"]);
        let parsed = parse_document(&text, MalformedPolicy::Abort).unwrap();
        assert_eq!(
            parsed.introduction,
            "UN/EDIFACT data element directory\nIntroduction text."
        );
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_section_order_preserved() {
        let text = doc(&[
            "3055 Code list responsible agency code\nRepr: an..3",
            "1001 Document name code\nRepr: an..3",
            "2005 Date or time qualifier\nRepr: an..3",
        ]);
        let ids: Vec<String> = parse_document(&text, MalformedPolicy::Abort)
            .unwrap()
            .records
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["3055", "1001", "2005"]);
    }

    #[test]
    fn test_deterministic() {
        let text = doc(&[
            "1001 Document name code [B]\nDesc: Code.\nRepr: an..3\nNote:\n1 a\n2 b",
            "1004 Document identifier [I]\nDesc: Reference.\nRepr: an..70",
        ]);
        let a = parse_document(&text, MalformedPolicy::Abort).unwrap();
        let b = parse_document(&text, MalformedPolicy::Abort).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_note_is_none() {
        let text = doc(&["1004 Document identifier\nDesc: Reference.\nRepr: an..70"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.note, None);
        assert_eq!(rec.usage_code, None);
        assert_eq!(rec.usage_description(), None);
    }

    #[test]
    fn test_empty_repr_line_still_decodes() {
        let text = "intro\n----------\n1001 Document name code\nDesc: Code.\nRepr:\n";
        let rec = &parse_document(text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.representation, "");
        assert_eq!(rec.representation_description, "characters");
        assert_eq!(rec.representation_type, TypeTag::Unknown);
        assert_eq!(rec.representation_max_length, None);

        // No Repr line at all leaves the description empty.
        let text = doc(&["1001 Document name code\nDesc: Code."]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.representation_description, "");
    }

    #[test]
    fn test_empty_note_is_some_empty() {
        let text = doc(&["1004 Document identifier\nDesc: Reference.\nNote:"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.note.as_deref(), Some(""));
    }

    #[test]
    fn test_note_capture_is_greedy() {
        let text = doc(&["1004 Document identifier\nDesc: Reference.\nNote:\n1 first\nRepr: an..70\nDesc: late"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.description, "Reference.");
        assert_eq!(rec.representation, "");
        assert_eq!(rec.representation_description, "");
        assert_eq!(
            rec.note.as_deref(),
            Some("first Repr: an..70 Desc: late")
        );
    }

    #[test]
    fn test_note_lines_keep_multi_digit_numbers() {
        let text = doc(&["1004 Document identifier\nNote:\n1 first\n12 items max\n2 second"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.note.as_deref(), Some("first 12 items max second"));
    }

    #[test]
    fn test_note_lines_do_not_reset_id() {
        let text = doc(&["1004 Document identifier\nNote:\n1 see 3055"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.id, "1004");
    }

    #[test]
    fn test_value_after_first_colon() {
        let text = doc(&["1004 Document identifier\nDesc: Reference: assigned by issuer.\nRepr: an..70"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.description, "Reference: assigned by issuer.");
    }

    #[test]
    fn test_indented_source_lines() {
        let text = doc(&["\n1001  Document name code                [B]\n\n     Desc: Code specifying the document name.\n\n     Repr: an..3\n"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.id, "1001");
        assert_eq!(rec.name, "Document name code");
        assert_eq!(rec.usage_code, Some(UsageCode::Batch));
        assert_eq!(rec.representation_description, "Up to 3 alphanumeric characters");
    }

    #[test]
    fn test_name_keeps_id_digits_elsewhere() {
        let text = doc(&["1001 Code 1001 variant"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.name, "Code 1001 variant");
    }

    #[test]
    fn test_markers_before_id_line() {
        let text = doc(&["Desc: Early description.\n1001 Document name code"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.id, "1001");
        assert_eq!(rec.description, "Early description.");
    }

    #[test]
    fn test_malformed_aborts() {
        let text = doc(&["1001 Document name code", "Desc: orphan description"]);
        let err = parse_document(&text, MalformedPolicy::Abort).unwrap_err();
        match err {
            EdedError::Parse { section, message } => {
                assert_eq!(section, 2);
                assert!(message.contains("orphan description"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_skipped() {
        let text = doc(&["Desc: orphan description", "1001 Document name code"]);
        let parsed = parse_document(&text, MalformedPolicy::Skip).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "1001");
    }

    #[test]
    fn test_note_before_id_is_malformed() {
        let text = doc(&["Note:\n1001 swallowed"]);
        assert!(parse_document(&text, MalformedPolicy::Abort).is_err());
    }

    #[test]
    fn test_blank_trailing_section_ignored() {
        let mut text = doc(&["1001 Document name code"]);
        text.push_str(DELIM);
        text.push_str("\n\n   \n");
        let parsed = parse_document(&text, MalformedPolicy::Abort).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_unknown_usage_token_fails_loudly() {
        let text = doc(&["1001 Document name code [X]"]);
        let err = parse_document(&text, MalformedPolicy::Skip).unwrap_err();
        assert!(matches!(err, EdedError::Lookup(ref t) if t == "[X]"));
    }

    #[test]
    fn test_no_delimiter_means_no_records() {
        let parsed = parse_document("just an introduction", MalformedPolicy::Abort).unwrap();
        assert_eq!(parsed.introduction, "just an introduction");
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn test_short_dash_line_is_not_delimiter() {
        let text = doc(&["1001 Document name code\n---------\nDesc: still same section"]);
        let parsed = parse_document(&text, MalformedPolicy::Abort).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].description, "still same section");
    }

    #[test]
    fn test_crlf_input() {
        let text = doc(&["1001 Document name code [I]\r\nDesc: Code.\r\nRepr: an..3\r"]);
        let rec = &parse_document(&text, MalformedPolicy::Abort).unwrap().records[0];
        assert_eq!(rec.usage_code, Some(UsageCode::Interactive));
        assert_eq!(rec.representation, "an..3");
    }
}
