//! Transcoding of raw comment payloads into playback formats.
//!
//! Two targets exist: an XML overlay document consumed by desktop
//! players, and a compact JSON array consumed by web players. Both are
//! derived from the same parsed entries; the raw payload on disk is
//! never modified.

use kandan_common::{Error, Result};

use crate::remote::CommentResponse;

/// Mode code for comments pinned to the bottom of the frame.
const MODE_BOTTOM_FIXED: &str = "5";

/// One comment with its packed attributes split out.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentEntry {
    /// Offset exactly as it appeared on the wire. Re-emitted unchanged
    /// in the XML overlay so no precision is lost.
    pub offset_raw: String,
    /// Offset parsed for numeric output.
    pub offset_secs: f64,
    /// Display mode code, kept as a string.
    pub mode: String,
    /// Decimal RGB color.
    pub color: i64,
    /// Opaque author identifier.
    pub author: String,
    pub text: String,
}

impl CommentEntry {
    pub fn is_bottom_fixed(&self) -> bool {
        self.mode == MODE_BOTTOM_FIXED
    }
}

/// Parse a raw payload into comment entries.
///
/// Every comment is carried over; nothing is filtered. A payload that
/// is not valid JSON of the expected shape, or that contains an entry
/// with a malformed `p` field, is an error as a whole, so downstream
/// output never silently loses comments.
pub fn parse_comments(payload: &str) -> Result<Vec<CommentEntry>> {
    let response: CommentResponse = serde_json::from_str(payload)
        .map_err(|e| Error::Validation(format!("malformed comment payload: {e}")))?;

    response
        .comments
        .iter()
        .map(|item| {
            parse_entry(&item.p, &item.m)
                .ok_or_else(|| Error::Validation(format!("malformed comment attributes: {}", item.p)))
        })
        .collect()
}

/// Split "offset,modeCode,colorCode,authorId".
fn parse_entry(p: &str, m: &str) -> Option<CommentEntry> {
    let mut parts = p.splitn(4, ',');
    let offset_raw = parts.next()?.to_string();
    let mode = parts.next()?.to_string();
    let color: i64 = parts.next()?.parse().ok()?;
    let author = parts.next()?.to_string();
    let offset_secs: f64 = offset_raw.parse().ok()?;

    Some(CommentEntry {
        offset_raw,
        offset_secs,
        mode,
        color,
        author,
        text: m.to_string(),
    })
}

/// Render entries as an XML overlay document.
///
/// Each entry becomes `<d p="offset,mode,25,color,-639093600,0,0,0">`.
/// The fixed trailing fields are font size, a constant timestamp, and
/// three reserved zeros; players ignore their values but require their
/// presence. An empty entry set still produces the full header.
pub fn to_overlay_markup(entries: &[CommentEntry]) -> String {
    let mut out = String::with_capacity(256 + entries.len() * 64);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<i>\n");
    out.push_str("<chatserver>chat.bilibili.com</chatserver>\n");
    out.push_str("<chatid>10000</chatid>\n");
    out.push_str("<mission>0</mission>\n");
    out.push_str("<maxlimit>8000</maxlimit>\n");
    out.push_str("<source>k-v</source>\n");
    out.push_str("<ds>0</ds>\n");
    out.push_str("<de>0</de>\n");
    for entry in entries {
        out.push_str(&format!(
            "<d p=\"{},{},25,{},-639093600,0,0,0\">{}</d>\n",
            entry.offset_raw,
            entry.mode,
            entry.color,
            escape_xml(&entry.text)
        ));
    }
    out.push_str("</i>\n");
    out
}

/// Render entries as the web player JSON document:
/// `{"code": 0, "data": [[offset, isBottomFixed, color, author, text]]}`.
pub fn to_web_json(entries: &[CommentEntry]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| {
            serde_json::json!([
                entry.offset_secs,
                if entry.is_bottom_fixed() { 1 } else { 0 },
                entry.color,
                entry.author,
                entry.text
            ])
        })
        .collect();

    serde_json::json!({ "code": 0, "data": data })
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
