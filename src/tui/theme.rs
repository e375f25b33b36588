use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::board::{AiState, NoticeLevel, Task};

/// Semantic colour theme for the board.
///
/// Every colour used by the renderer is stored here so the user can
/// override any of them via `[theme]` in `config.toml`.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Borders ───────────────────────────────────────────────
    pub border_focused: Color,
    pub border_unfocused: Color,

    // ── Text ──────────────────────────────────────────────────
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_accent: Color,

    // ── Tasks ─────────────────────────────────────────────────
    pub task_open: Color,
    pub task_done: Color,
    pub task_trigger: Color,
    pub task_failed: Color,

    // ── Progress ──────────────────────────────────────────────
    pub gauge_low: Color,
    pub gauge_medium: Color,
    pub gauge_full: Color,

    // ── Toast ─────────────────────────────────────────────────
    pub toast_info: Color,
    pub toast_success: Color,
    pub toast_error: Color,

    // ── Misc ──────────────────────────────────────────────────
    pub banner: Color,
    pub selection_indicator: Color,
    pub spinner: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,

            text_primary: Color::White,
            text_secondary: Color::DarkGray,
            text_accent: Color::Cyan,

            task_open: Color::White,
            task_done: Color::Green,
            task_trigger: Color::Magenta,
            task_failed: Color::Red,

            gauge_low: Color::Yellow,
            gauge_medium: Color::Cyan,
            gauge_full: Color::Green,

            toast_info: Color::Cyan,
            toast_success: Color::Green,
            toast_error: Color::Red,

            banner: Color::Rgb(255, 215, 0),
            selection_indicator: Color::Cyan,
            spinner: Color::Yellow,
        }
    }
}

impl Theme {
    /// Style for a focused panel border.
    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    /// Style for an unfocused panel border.
    pub fn unfocused_border(&self) -> Style {
        Style::default().fg(self.border_unfocused)
    }

    /// Style for a task row. Completed tasks are dimmed and struck through.
    pub fn task_style(&self, task: &Task, ai: &AiState) -> Style {
        if task.completed {
            return Style::default()
                .fg(self.task_done)
                .add_modifier(Modifier::CROSSED_OUT);
        }
        let color = match ai {
            AiState::Failed { .. } => self.task_failed,
            AiState::Requesting { .. } => self.spinner,
            AiState::Idle | AiState::Succeeded => match task.control_kind {
                crate::board::ControlKind::Checkbox => self.task_open,
                crate::board::ControlKind::Triggerable => self.task_trigger,
            },
        };
        Style::default().fg(color)
    }

    /// Style for a toast notification.
    pub fn toast_style(&self, level: NoticeLevel) -> Style {
        let color = match level {
            NoticeLevel::Info => self.toast_info,
            NoticeLevel::Success => self.toast_success,
            NoticeLevel::Error => self.toast_error,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Colour for the progress gauge at the given percentage.
    pub fn gauge_color(&self, pct: u16) -> Color {
        if pct >= 100 {
            self.gauge_full
        } else if pct >= 50 {
            self.gauge_medium
        } else {
            self.gauge_low
        }
    }

    pub fn banner_style(&self) -> Style {
        Style::default()
            .fg(self.banner)
            .add_modifier(Modifier::BOLD)
    }
}

// ── Config deserialization ────────────────────────────────────────────

/// All-optional mirror of [`Theme`] for `config.toml` `[theme]` section.
///
/// Only `Some` fields override the default; everything else keeps its default.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ThemeConfig {
    pub border_focused: Option<String>,
    pub border_unfocused: Option<String>,

    pub text_primary: Option<String>,
    pub text_secondary: Option<String>,
    pub text_accent: Option<String>,

    pub task_open: Option<String>,
    pub task_done: Option<String>,
    pub task_trigger: Option<String>,
    pub task_failed: Option<String>,

    pub gauge_low: Option<String>,
    pub gauge_medium: Option<String>,
    pub gauge_full: Option<String>,

    pub toast_info: Option<String>,
    pub toast_success: Option<String>,
    pub toast_error: Option<String>,

    pub banner: Option<String>,
    pub selection_indicator: Option<String>,
    pub spinner: Option<String>,
}

/// Parse a colour string into a ratatui `Color`.
///
/// Supports named colours (`"cyan"`, `"red"`, `"dark_gray"`, etc.),
/// `"#RRGGBB"` and `"rgb(R,G,B)"` syntax.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() == 3 {
            let r = parts[0].trim().parse::<u8>().ok()?;
            let g = parts[1].trim().parse::<u8>().ok()?;
            let b = parts[2].trim().parse::<u8>().ok()?;
            return Some(Color::Rgb(r, g, b));
        }
        return None;
    }

    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }

    // Named colours (case-insensitive, with underscore tolerance)
    let lower = s.to_lowercase().replace('-', "_");
    match lower.as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "gray" | "grey" => Some(Color::Gray),
        "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "light_red" | "lightred" => Some(Color::LightRed),
        "light_green" | "lightgreen" => Some(Color::LightGreen),
        "light_yellow" | "lightyellow" => Some(Color::LightYellow),
        "light_blue" | "lightblue" => Some(Color::LightBlue),
        "light_magenta" | "lightmagenta" => Some(Color::LightMagenta),
        "light_cyan" | "lightcyan" => Some(Color::LightCyan),
        "white" => Some(Color::White),
        _ => None,
    }
}

/// Apply an optional config field: if the string parses to a valid colour,
/// overwrite `target`.
fn apply(target: &mut Color, source: Option<&String>) {
    if let Some(s) = source
        && let Some(color) = parse_color(s)
    {
        *target = color;
    }
}

impl ThemeConfig {
    /// Build a `Theme` starting from defaults, overriding any fields that were
    /// set in the config file.
    pub fn build(&self) -> Theme {
        let mut t = Theme::default();

        apply(&mut t.border_focused, self.border_focused.as_ref());
        apply(&mut t.border_unfocused, self.border_unfocused.as_ref());
        apply(&mut t.text_primary, self.text_primary.as_ref());
        apply(&mut t.text_secondary, self.text_secondary.as_ref());
        apply(&mut t.text_accent, self.text_accent.as_ref());
        apply(&mut t.task_open, self.task_open.as_ref());
        apply(&mut t.task_done, self.task_done.as_ref());
        apply(&mut t.task_trigger, self.task_trigger.as_ref());
        apply(&mut t.task_failed, self.task_failed.as_ref());
        apply(&mut t.gauge_low, self.gauge_low.as_ref());
        apply(&mut t.gauge_medium, self.gauge_medium.as_ref());
        apply(&mut t.gauge_full, self.gauge_full.as_ref());
        apply(&mut t.toast_info, self.toast_info.as_ref());
        apply(&mut t.toast_success, self.toast_success.as_ref());
        apply(&mut t.toast_error, self.toast_error.as_ref());
        apply(&mut t.banner, self.banner.as_ref());
        apply(
            &mut t.selection_indicator,
            self.selection_indicator.as_ref(),
        );
        apply(&mut t.spinner, self.spinner.as_ref());

        t
    }
}
