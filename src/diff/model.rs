use serde::{Deserialize, Serialize};

// ── Line kinds ──

/// Classification of a diff line. Encoded on the wire as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DiffKind {
    /// Unchanged line shown for context
    Context,
    /// Added, removed or edited line
    Change,
    /// Original position of a moved paragraph
    MoveSource,
    /// New position of a moved paragraph
    MoveDestination,
}

impl DiffKind {
    pub fn is_move(&self) -> bool {
        matches!(self, DiffKind::MoveSource | DiffKind::MoveDestination)
    }

    /// Single-character gutter marker
    pub fn marker(&self) -> &'static str {
        match self {
            DiffKind::Context => " ",
            DiffKind::Change => "~",
            DiffKind::MoveSource => "<",
            DiffKind::MoveDestination => ">",
        }
    }
}

impl TryFrom<u8> for DiffKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DiffKind::Context),
            1 => Ok(DiffKind::Change),
            2 => Ok(DiffKind::MoveSource),
            3 => Ok(DiffKind::MoveDestination),
            other => Err(format!("unknown diff line type {}", other)),
        }
    }
}

impl From<DiffKind> for u8 {
    fn from(kind: DiffKind) -> u8 {
        match kind {
            DiffKind::Context => 0,
            DiffKind::Change => 1,
            DiffKind::MoveSource => 2,
            DiffKind::MoveDestination => 3,
        }
    }
}

// ── Highlights ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HighlightKind {
    Add,
    Delete,
}

impl TryFrom<u8> for HighlightKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(HighlightKind::Add),
            1 => Ok(HighlightKind::Delete),
            other => Err(format!("unknown highlight range type {}", other)),
        }
    }
}

impl From<HighlightKind> for u8 {
    fn from(kind: HighlightKind) -> u8 {
        match kind {
            HighlightKind::Add => 0,
            HighlightKind::Delete => 1,
        }
    }
}

/// Byte range inside a line's text that was added or deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRange {
    pub start: usize,
    pub length: usize,
    #[serde(rename = "type")]
    pub kind: HighlightKind,
}

// ── Lines ──

/// Pairing info for a moved paragraph. `link_id` is the `id` of the other half.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInfo {
    pub id: String,
    pub link_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    /// 1-based line number; deleted lines and move sources may lack one
    #[serde(default)]
    pub line_number: Option<usize>,
    #[serde(rename = "type")]
    pub kind: DiffKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub highlight_ranges: Vec<HighlightRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_info: Option<MoveInfo>,
    /// Index into the response's section table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_info_index: Option<usize>,
}

impl DiffLine {
    pub fn is_move(&self) -> bool {
        self.kind.is_move()
    }

    /// Split the text into plain and highlighted pieces, in order.
    /// Ranges are clamped to the text, snapped forward to char boundaries,
    /// and any overlap with an earlier range is dropped.
    pub fn segments(&self) -> Vec<(&str, Option<HighlightKind>)> {
        let text = self.text.as_str();
        let mut ranges: Vec<&HighlightRange> = self.highlight_ranges.iter().collect();
        ranges.sort_by_key(|r| r.start);

        let mut out = Vec::new();
        let mut pos = 0usize;
        for range in ranges {
            let start = ceil_char_boundary(text, range.start.max(pos));
            let end = ceil_char_boundary(text, range.start.saturating_add(range.length));
            if end <= start {
                continue;
            }
            if start > pos {
                out.push((&text[pos..start], None));
            }
            out.push((&text[start..end], Some(range.kind)));
            pos = end;
        }
        if pos < text.len() {
            out.push((&text[pos..], None));
        }
        out
    }
}

fn ceil_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

// ── Sections ──

/// A heading-delimited subdivision of the article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionInfo {
    /// Raw heading, e.g. `==Biology==`
    pub title: String,
    /// Ordinal position among sections
    pub location: i64,
}

impl SectionInfo {
    #[allow(dead_code)]
    pub fn new(title: impl Into<String>, location: i64) -> Self {
        Self {
            title: title.into(),
            location,
        }
    }

    /// Heading text without the surrounding `=` markup
    pub fn display_title(&self) -> &str {
        self.title.trim().trim_matches('=').trim()
    }
}

// ── Response ──

/// A diff as delivered by the upstream diff service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    #[serde(default)]
    pub diff: Vec<DiffLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_info: Option<Vec<SectionInfo>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with(text: &str, ranges: Vec<HighlightRange>) -> DiffLine {
        DiffLine {
            line_number: Some(1),
            kind: DiffKind::Change,
            text: text.to_string(),
            highlight_ranges: ranges,
            move_info: None,
            section_info_index: None,
        }
    }

    fn range(start: usize, length: usize, kind: HighlightKind) -> HighlightRange {
        HighlightRange { start, length, kind }
    }

    #[test]
    fn parses_integer_codes() {
        let json = r#"{
            "diff": [
                {"lineNumber": 1, "type": 0, "text": "intro", "highlightRanges": []},
                {"type": 2, "text": "moved", "highlightRanges": [{"start": 0, "length": 5, "type": 1}],
                 "moveInfo": {"id": "a", "linkId": "b"}, "sectionInfoIndex": 1}
            ],
            "sectionInfo": [{"title": "==Taxonomy==", "location": 1}]
        }"#;
        let resp: DiffResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.diff.len(), 2);
        assert_eq!(resp.diff[0].kind, DiffKind::Context);
        assert_eq!(resp.diff[1].kind, DiffKind::MoveSource);
        assert_eq!(resp.diff[1].line_number, None);
        assert_eq!(resp.diff[1].highlight_ranges[0].kind, HighlightKind::Delete);
        assert_eq!(resp.diff[1].move_info.as_ref().unwrap().link_id, "b");
        assert_eq!(resp.section_info.as_ref().unwrap()[0].location, 1);
    }

    #[test]
    fn rejects_unknown_kind_code() {
        let json = r#"{"diff": [{"type": 7, "text": "x"}]}"#;
        let err = serde_json::from_str::<DiffResponse>(json).unwrap_err();
        assert!(err.to_string().contains("unknown diff line type 7"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let resp: DiffResponse = serde_json::from_str(r#"{"diff": [{"type": 1}]}"#).unwrap();
        assert_eq!(resp.diff[0].text, "");
        assert!(resp.diff[0].highlight_ranges.is_empty());
        assert!(resp.section_info.is_none());
    }

    #[test]
    fn segments_split_around_ranges() {
        let line = line_with(
            "the quick brown fox",
            vec![range(10, 5, HighlightKind::Add), range(0, 3, HighlightKind::Delete)],
        );
        let segs = line.segments();
        assert_eq!(
            segs,
            vec![
                ("the", Some(HighlightKind::Delete)),
                (" quick ", None),
                ("brown", Some(HighlightKind::Add)),
                (" fox", None),
            ]
        );
    }

    #[test]
    fn segments_clamp_out_of_bounds_and_multibyte() {
        // "é" is two bytes; a range starting inside it snaps forward
        let line = line_with("aé b", vec![range(2, 100, HighlightKind::Add)]);
        let segs = line.segments();
        assert_eq!(segs, vec![("aé", None), (" b", Some(HighlightKind::Add))]);
    }

    #[test]
    fn segments_of_empty_text() {
        let line = line_with("", vec![range(0, 3, HighlightKind::Add)]);
        assert!(line.segments().is_empty());
    }

    #[test]
    fn display_title_strips_heading_markup() {
        assert_eq!(SectionInfo::new("===Senses===", 3).display_title(), "Senses");
        assert_eq!(SectionInfo::new("== See also ==", 10).display_title(), "See also");
    }
}
