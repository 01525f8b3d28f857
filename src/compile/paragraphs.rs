//! Paragraph reflow for recognised text.
//!
//! ## Why reflow at all?
//!
//! Page recognition emits one line per visual line of the scan, so a single
//! printed paragraph arrives as a stack of short lines with hard breaks.
//! Downstream markup wants logical paragraphs. The heuristic is the one
//! every plain-text format has used for decades: a blank line separates
//! paragraphs, everything between blank lines is one paragraph.

/// Split `text` into logical paragraphs.
///
/// Lines are trimmed; one or more blank lines end the current paragraph;
/// the lines of a paragraph are joined with single spaces. Runs of blank
/// lines and leading/trailing blank lines produce no empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}
