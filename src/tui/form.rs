//! Single-line text input and modal helpers shared by the dialogs.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

// ── Text editing ──────────────────────────────────────────────────────

fn prev_char_boundary(buf: &str, cursor: usize) -> usize {
    buf[..cursor]
        .char_indices()
        .next_back()
        .map_or(0, |(i, _)| i)
}

fn next_char_boundary(buf: &str, cursor: usize) -> usize {
    buf[cursor..]
        .chars()
        .next()
        .map_or(cursor, |c| cursor + c.len_utf8())
}

/// Start of the word before `cursor`, skipping trailing separators. Path
/// separators count as word breaks so Ctrl+W strips one path segment.
fn word_start(buf: &str, cursor: usize) -> usize {
    let is_break = |c: char| c.is_whitespace() || c == '/';
    let before = buf[..cursor].trim_end_matches(is_break);
    before
        .char_indices()
        .rev()
        .find(|&(_, c)| is_break(c))
        .map_or(0, |(i, c)| i + c.len_utf8())
}

/// Apply an editing key to `buf`, keeping `cursor` on a char boundary.
/// Returns `true` if the key was consumed.
pub fn apply_text_edit(
    buf: &mut String,
    cursor: &mut usize,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> bool {
    *cursor = (*cursor).min(buf.len());
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    match code {
        KeyCode::Left => *cursor = prev_char_boundary(buf, *cursor),
        KeyCode::Right => *cursor = next_char_boundary(buf, *cursor),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = buf.len(),
        KeyCode::Backspace if modifiers.contains(KeyModifiers::ALT) => {
            let start = word_start(buf, *cursor);
            buf.drain(start..*cursor);
            *cursor = start;
        }
        KeyCode::Backspace => {
            let start = prev_char_boundary(buf, *cursor);
            buf.drain(start..*cursor);
            *cursor = start;
        }
        KeyCode::Delete => {
            let end = next_char_boundary(buf, *cursor);
            buf.drain(*cursor..end);
        }
        KeyCode::Char('w') if ctrl => {
            let start = word_start(buf, *cursor);
            buf.drain(start..*cursor);
            *cursor = start;
        }
        KeyCode::Char('u') if ctrl => {
            buf.drain(..*cursor);
            *cursor = 0;
        }
        KeyCode::Char(c) if !ctrl && !modifiers.contains(KeyModifiers::ALT) => {
            buf.insert(*cursor, c);
            *cursor += c.len_utf8();
        }
        _ => return false,
    }
    true
}

/// Text with a block cursor drawn at `cursor`.
pub fn format_with_cursor(buf: &str, cursor: usize) -> String {
    let (before, after) = buf.split_at(cursor.min(buf.len()));
    format!("{before}\u{2588}{after}")
}

// ── Rendering helpers ─────────────────────────────────────────────────

/// Clear a centred `width`×`height` panel, draw its border, and return the
/// inner area.
pub fn render_modal(
    frame: &mut Frame,
    title: &str,
    border_style: Style,
    width: u16,
    height: u16,
) -> Rect {
    let area = frame.area();
    let w = width.min(area.width.saturating_sub(4));
    let h = height.min(area.height.saturating_sub(4));
    let panel = Rect::new(
        area.width.saturating_sub(w) / 2,
        area.height.saturating_sub(h) / 2,
        w,
        h,
    );

    frame.render_widget(Clear, panel);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(panel);
    frame.render_widget(block, panel);
    inner
}

/// Lines `text` wraps to at `width`. At least 1.
pub fn measure_wrapped_height(text: &str, width: u16) -> u16 {
    if width == 0 {
        return 1;
    }
    Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .line_count(width)
        .max(1) as u16
}

/// One-line bar of `key` `description` pairs.
pub fn render_hints(
    frame: &mut Frame,
    area: Rect,
    hints: &[(&str, &str)],
    key_style: Style,
    desc_style: Style,
) {
    let spans: Vec<Span<'_>> = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(*key, key_style),
                Span::styled(*desc, desc_style),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(buf: &str, cursor: usize, code: KeyCode, modifiers: KeyModifiers) -> (String, usize) {
        let mut buf = buf.to_string();
        let mut cursor = cursor;
        apply_text_edit(&mut buf, &mut cursor, code, modifiers);
        (buf, cursor)
    }

    #[test]
    fn typing_inserts_at_cursor() {
        assert_eq!(
            edit("dng.wav", 1, KeyCode::Char('i'), KeyModifiers::NONE),
            ("ding.wav".to_string(), 2)
        );
    }

    #[test]
    fn backspace_and_delete_respect_multibyte() {
        assert_eq!(
            edit("café", 5, KeyCode::Backspace, KeyModifiers::NONE),
            ("caf".to_string(), 3)
        );
        assert_eq!(
            edit("éa", 0, KeyCode::Delete, KeyModifiers::NONE),
            ("a".to_string(), 0)
        );
        assert_eq!(edit("é", 2, KeyCode::Left, KeyModifiers::NONE).1, 0);
    }

    #[test]
    fn ctrl_w_removes_one_path_segment() {
        assert_eq!(
            edit("sounds/pop.wav", 14, KeyCode::Char('w'), KeyModifiers::CONTROL),
            ("sounds/".to_string(), 7)
        );
        assert_eq!(
            edit("sounds/", 7, KeyCode::Char('w'), KeyModifiers::CONTROL),
            (String::new(), 0)
        );
    }

    #[test]
    fn ctrl_u_clears_before_cursor() {
        assert_eq!(
            edit("abc def", 4, KeyCode::Char('u'), KeyModifiers::CONTROL),
            ("def".to_string(), 0)
        );
    }

    #[test]
    fn other_ctrl_keys_are_not_consumed() {
        let mut buf = String::from("abc");
        let mut cursor = 3;
        assert!(!apply_text_edit(
            &mut buf,
            &mut cursor,
            KeyCode::Char('a'),
            KeyModifiers::CONTROL
        ));
        assert_eq!(buf, "abc");
    }

    #[test]
    fn cursor_is_drawn_in_place() {
        assert_eq!(format_with_cursor("ab", 1), "a\u{2588}b");
        assert_eq!(format_with_cursor("ab", 9), "ab\u{2588}");
    }
}
