//! Text ⇄ list framing for list content typed as free-form text.
//!
//! Paragraph mode splits on blank lines. Bullet mode takes one item per
//! line, strips a leading bullet marker and drops empty lines.

/// Markers accepted at the start of a bullet line.
const BULLET_MARKERS: [char; 4] = ['•', '-', '*', '+'];

/// Marker written in front of each bullet when rendering text.
const BULLET_PREFIX: &str = "• ";

/// How list content maps to editable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFraming {
    Paragraphs,
    Bullets,
}

impl ListFraming {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paragraphs" | "paragraph" => Some(Self::Paragraphs),
            "bullets" | "bullet" => Some(Self::Bullets),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraphs => "paragraphs",
            Self::Bullets => "bullets",
        }
    }

    /// Split edited text into list items.
    pub fn items_from_text(&self, text: &str) -> Vec<String> {
        match self {
            Self::Paragraphs => paragraphs_from_text(text),
            Self::Bullets => bullets_from_text(text),
        }
    }

    /// Render list items as editable text.
    pub fn text_from_items<S: AsRef<str>>(&self, items: &[S]) -> String {
        match self {
            Self::Paragraphs => items
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join("\n\n"),
            Self::Bullets => items
                .iter()
                .map(|item| format!("{BULLET_PREFIX}{}", item.as_ref()))
                .collect::<Vec<String>>()
                .join("\n"),
        }
    }
}

/// Paragraphs separated by one or more blank (whitespace-only) lines.
///
/// Lines inside a paragraph keep their line breaks; each paragraph is
/// trimmed.
pub fn paragraphs_from_text(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);

    paragraphs
}

fn flush_paragraph(current: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let paragraph = current.join("\n").trim().to_string();
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
    current.clear();
}

/// One bullet per non-empty line, leading marker removed.
pub fn bullets_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_bullet_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet_marker(line: &str) -> &str {
    let trimmed = line.trim();
    match trimmed.strip_prefix(BULLET_MARKERS) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => trimmed,
    }
}
