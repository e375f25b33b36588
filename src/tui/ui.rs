use std::fmt::Write as _;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};

use crate::board::{AiState, Behavior, PrioritizationReport, SoundTrigger, TaskId};

use super::app::{App, Mode};
use super::form;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw(frame: &mut Frame, app: &App) {
    draw_board(frame, app);

    match app.mode {
        Mode::Board => {}
        Mode::ActionView(id) => draw_action_view(frame, app, id),
        Mode::Report => draw_report(frame, app),
        Mode::Sounds => draw_sounds(frame, app, None),
        Mode::EditSound(trigger) => draw_sounds(frame, app, Some(trigger)),
        Mode::ConfirmReset => draw_confirm_reset(frame, app),
        Mode::Help => draw_help(frame, app),
    }

    if let Some(confetti) = &app.confetti {
        frame.render_widget(confetti, frame.area());
    }

    draw_toast(frame, app);
}

/// Plain-text rendering of a report, used for the dialog and the clipboard.
pub fn report_text(report: &PrioritizationReport) -> String {
    let mut out = String::new();
    for (i, label) in report.ordered_labels.iter().enumerate() {
        let _ = writeln!(out, "{}. {label}", i + 1);
    }
    let _ = write!(out, "\n{}", report.reasoning);
    out
}

fn draw_board(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let complete = app.board.is_fully_complete();

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(if complete { 4 } else { 0 }),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Title bar
    let title = Line::from(vec![
        Span::styled(
            " actionboard ",
            Style::default()
                .fg(theme.text_accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", crate::VERSION),
            Style::default().fg(theme.text_secondary),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), outer[0]);

    // Progress
    let pct = app.board.progress_percent();
    let done = app.board.tasks().iter().filter(|t| t.completed).count();
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Progress ")
                .borders(Borders::ALL)
                .border_style(theme.unfocused_border()),
        )
        .gauge_style(Style::default().fg(theme.gauge_color(pct)))
        .percent(pct)
        .label(format!("{done}/{} ({pct}%)", app.board.tasks().len()));
    frame.render_widget(gauge, outer[1]);

    if complete {
        let banner = Paragraph::new(vec![
            Line::from(Span::styled("Job Complete!", theme.banner_style())),
            Line::from(Span::styled(
                "Great work, time to celebrate!",
                Style::default().fg(theme.text_primary),
            )),
        ])
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.banner)),
        );
        frame.render_widget(banner, outer[2]);
    }

    draw_tasks(frame, app, outer[3]);

    let hints: &[(&str, &str)] = &[
        ("Enter", ":do  "),
        ("j/k", ":move  "),
        ("p", ":priorities  "),
        ("s", ":sounds  "),
        ("R", ":reset  "),
        ("?", ":help  "),
        ("q", ":quit"),
    ];
    form::render_hints(
        frame,
        outer[4],
        hints,
        Style::default().fg(theme.text_accent),
        Style::default().fg(theme.text_secondary),
    );
}

fn draw_tasks(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let spinner = SPINNER[app.spinner_frame % SPINNER.len()];

    let items: Vec<ListItem> = app
        .board
        .tasks()
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let ai = app.board.ai_state(task.id);
            let selected = i == app.task_index && app.mode == Mode::Board;
            let prefix = if selected { "▸ " } else { "  " };

            let symbol = match ai {
                AiState::Requesting { .. } => spinner,
                _ => task.symbol(),
            };
            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(theme.selection_indicator)),
                Span::styled(format!("{symbol} "), theme.task_style(task, ai)),
                Span::styled(task.label.clone(), theme.task_style(task, ai)),
            ];
            let suffix = match (ai, task.behavior) {
                (AiState::Requesting { .. }, _) => Some(" prioritizing…".to_string()),
                (AiState::Failed { .. }, _) if !task.completed => Some(" failed, press Enter to retry".to_string()),
                (_, Behavior::NavigateAndComplete) if !task.completed => Some(" →".to_string()),
                _ => None,
            };
            if let Some(suffix) = suffix {
                spans.push(Span::styled(suffix, Style::default().fg(theme.text_secondary)));
            }
            let mut item = ListItem::new(Line::from(spans));
            if selected {
                item = item.style(Style::default().add_modifier(Modifier::BOLD));
            }
            item
        })
        .collect();

    let block = Block::default()
        .title(" Actions ")
        .borders(Borders::ALL)
        .border_style(if app.mode == Mode::Board {
            theme.focused_border()
        } else {
            theme.unfocused_border()
        });
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_action_view(frame: &mut Frame, app: &App, id: TaskId) {
    let theme = &app.theme;
    let inner = form::render_modal(frame, " Action ", theme.focused_border(), 56, 9);
    let label = app
        .board
        .task(id)
        .map_or("Unknown action", |t| t.label.as_str());

    let lines = vec![
        Line::from(Span::styled(
            label,
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Finish the work for this action, then mark it complete.",
            Style::default().fg(theme.text_secondary),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "[ Complete Action ]",
                Style::default()
                    .fg(theme.task_done)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            ),
            Span::styled("  Enter  ·  Esc back", Style::default().fg(theme.text_secondary)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_report(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let Some(report) = app.board.report() else {
        return;
    };

    let text = report_text(report);
    let width = 64;
    let body_height = form::measure_wrapped_height(&text, width - 2);
    let inner = form::render_modal(
        frame,
        " Suggested Priorities ",
        theme.focused_border(),
        width,
        body_height + 4,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let mut lines: Vec<Line> = report
        .ordered_labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(theme.text_accent)),
                Span::styled(label.as_str(), Style::default().fg(theme.text_primary)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        report.reasoning.as_str(),
        Style::default().fg(theme.text_secondary),
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[0]);

    form::render_hints(
        frame,
        chunks[1],
        &[("c", ":copy  "), ("d", ":dismiss  "), ("Esc", ":close")],
        Style::default().fg(theme.text_accent),
        Style::default().fg(theme.text_secondary),
    );
}

fn draw_sounds(frame: &mut Frame, app: &App, editing: Option<SoundTrigger>) {
    let theme = &app.theme;
    let inner = form::render_modal(frame, " Sounds ", theme.focused_border(), 56, 9);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let prefs = app.board.sound_preferences();
    let items: Vec<ListItem> = SoundTrigger::ALL
        .iter()
        .enumerate()
        .map(|(i, &trigger)| {
            let selected = i == app.sound_index;
            let value = if editing == Some(trigger) {
                Span::styled(
                    form::format_with_cursor(&app.input_buffer, app.input_cursor),
                    Style::default().fg(theme.text_accent),
                )
            } else {
                match prefs.get(trigger) {
                    Some(id) => Span::styled(id.to_string(), Style::default().fg(theme.text_primary)),
                    None => Span::styled("(none)", Style::default().fg(theme.text_secondary)),
                }
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    if selected { "▸ " } else { "  " },
                    Style::default().fg(theme.selection_indicator),
                ),
                Span::styled(
                    format!("{:<12}", trigger.as_str()),
                    Style::default().fg(theme.text_primary),
                ),
                value,
            ]))
        })
        .collect();
    frame.render_widget(List::new(items), chunks[0]);

    let hints: &[(&str, &str)] = if editing.is_some() {
        &[("Enter", ":save  "), ("Esc", ":cancel")]
    } else {
        &[("e", ":edit  "), ("x", ":clear  "), ("t", ":test  "), ("Esc", ":close")]
    };
    form::render_hints(
        frame,
        chunks[1],
        hints,
        Style::default().fg(theme.text_accent),
        Style::default().fg(theme.text_secondary),
    );
}

fn draw_confirm_reset(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let inner = form::render_modal(
        frame,
        " Reset ",
        Style::default().fg(theme.toast_error),
        44,
        5,
    );
    let lines = vec![
        Line::from("Mark every action incomplete?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(theme.toast_error)),
            Span::styled(":reset  ", Style::default().fg(theme.text_secondary)),
            Span::styled("any", Style::default().fg(theme.text_accent)),
            Span::styled(":cancel", Style::default().fg(theme.text_secondary)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let sections = app.keymap.help_entries();
    let rows: usize = sections.iter().map(|(_, e)| e.len() + 2).sum();
    let inner = form::render_modal(
        frame,
        " Help ",
        theme.focused_border(),
        48,
        rows as u16 + 2,
    );

    let mut lines = Vec::new();
    for (title, entries) in sections {
        lines.push(Line::from(Span::styled(
            title,
            Style::default()
                .fg(theme.text_accent)
                .add_modifier(Modifier::BOLD),
        )));
        for entry in entries {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<10}", entry.label), Style::default().fg(theme.text_primary)),
                Span::styled(entry.description, Style::default().fg(theme.text_secondary)),
            ]));
        }
        lines.push(Line::from(""));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_toast(frame: &mut Frame, app: &App) {
    let Some(toast) = &app.toast else {
        return;
    };
    let area = frame.area();
    let width = (toast.message.chars().count() as u16 + 4).min(area.width);
    let rect = Rect::new(
        area.width.saturating_sub(width),
        area.height.saturating_sub(4),
        width,
        3u16.min(area.height),
    );
    frame.render_widget(Clear, rect);
    let style = app.theme.toast_style(toast.level);
    frame.render_widget(
        Paragraph::new(Span::styled(toast.message.as_str(), style)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style),
        ),
        rect,
    );
}
