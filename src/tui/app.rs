use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::board::{Activation, Board, Effect, Notice, NoticeLevel, SoundTrigger, TaskId};
use crate::sound::{self, SoundPlayer};

use super::confetti::Confetti;
use super::event::{self, AppEvent};
use super::form;
use super::keymap::{Action, KeyMap};
use super::theme::Theme;
use super::ui;

const TICK_RATE: Duration = Duration::from_millis(100);
const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Board,
    /// Single-action view for a navigate-and-complete task.
    ActionView(TaskId),
    Report,
    Sounds,
    EditSound(SoundTrigger),
    ConfirmReset,
    Help,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: NoticeLevel,
    pub message: String,
    expires_at: Instant,
}

pub struct App {
    pub board: Board,
    player: Box<dyn SoundPlayer>,
    pub theme: Theme,
    pub keymap: KeyMap,
    pub mode: Mode,
    pub should_quit: bool,

    pub task_index: usize,
    pub sound_index: usize,

    // Sound id editor
    pub input_buffer: String,
    pub input_cursor: usize,

    pub toast: Option<Toast>,
    pub confetti: Option<Confetti>,
    pub spinner_frame: usize,
}

impl App {
    /// `completed_task` is a completion signal carried in from the command
    /// line, processed once before the first frame.
    pub fn new(
        board: Board,
        player: Box<dyn SoundPlayer>,
        theme: Theme,
        completed_task: Option<TaskId>,
    ) -> Self {
        let mut app = App {
            board,
            player,
            theme,
            keymap: KeyMap::default_keymap(),
            mode: Mode::Board,
            should_quit: false,
            task_index: 0,
            sound_index: 0,
            input_buffer: String::new(),
            input_cursor: 0,
            toast: None,
            confetti: None,
            spinner_frame: 0,
        };
        if let Some(id) = completed_task {
            app.board.signal_completed(id);
            app.board.consume_handoff();
            app.apply_effects();
        }
        app
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut last_tick = Instant::now();

        loop {
            terminal.draw(|frame| ui::draw(frame, self))?;

            match event::poll(TICK_RATE)? {
                AppEvent::Key(key) => self.handle_key(key.code, key.modifiers),
                AppEvent::Tick => {}
            }

            let now = Instant::now();
            self.tick(now.duration_since(last_tick));
            last_tick = now;

            if self.should_quit {
                self.board.flush();
                return Ok(());
            }
        }
    }

    /// Advance animations and fold in background results.
    pub fn tick(&mut self, dt: Duration) {
        self.board.poll();
        self.apply_effects();

        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        if let Some(confetti) = &mut self.confetti {
            confetti.advance(dt);
            if confetti.is_finished() {
                self.confetti = None;
            }
        }
        if self
            .toast
            .as_ref()
            .is_some_and(|t| Instant::now() >= t.expires_at)
        {
            self.toast = None;
        }
    }

    pub fn selected_task(&self) -> Option<TaskId> {
        self.board.tasks().get(self.task_index).map(|t| t.id)
    }

    pub fn selected_trigger(&self) -> SoundTrigger {
        SoundTrigger::ALL[self.sound_index.min(SoundTrigger::ALL.len() - 1)]
    }

    fn apply_effects(&mut self) {
        for effect in self.board.drain_effects() {
            match effect {
                Effect::Play(trigger) => {
                    sound::play_trigger(self.player.as_ref(), self.board.sound_preferences(), trigger);
                }
                Effect::Celebrate => {
                    self.confetti = Some(Confetti::burst(&mut rand::thread_rng()));
                }
                Effect::ClearCelebration => self.confetti = None,
                Effect::Notice(Notice { level, message }) => self.show_toast(level, message),
                Effect::ReportReady => {
                    if self.mode == Mode::Board {
                        self.mode = Mode::Report;
                    }
                }
            }
        }
    }

    fn show_toast(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    // ── Key handling ──

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match self.mode {
            Mode::Board => self.handle_board_key(code, modifiers),
            Mode::ActionView(id) => self.handle_action_view_key(id, code),
            Mode::Report => self.handle_report_key(code),
            Mode::Sounds => self.handle_sounds_key(code),
            Mode::EditSound(trigger) => self.handle_edit_sound_key(trigger, code, modifiers),
            Mode::ConfirmReset => self.handle_confirm_reset_key(code),
            Mode::Help => self.mode = Mode::Board,
        }
        self.apply_effects();
    }

    fn handle_board_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let Some(action) = self.keymap.lookup(code, modifiers) else {
            return;
        };
        match action {
            Action::Quit => self.should_quit = true,
            Action::ShowHelp => self.mode = Mode::Help,
            Action::MoveDown => {
                let last = self.board.tasks().len().saturating_sub(1);
                self.task_index = (self.task_index + 1).min(last);
            }
            Action::MoveUp => self.task_index = self.task_index.saturating_sub(1),
            Action::Activate => {
                if let Some(id) = self.selected_task()
                    && let Activation::Navigate(target) = self.board.activate(id)
                {
                    self.mode = Mode::ActionView(target);
                }
            }
            Action::ShowReport => {
                if self.board.report().is_some() {
                    self.mode = Mode::Report;
                } else {
                    self.show_toast(NoticeLevel::Info, "No prioritization yet");
                }
            }
            Action::OpenSounds => self.mode = Mode::Sounds,
            Action::Reset => self.mode = Mode::ConfirmReset,
        }
    }

    fn handle_action_view_key(&mut self, id: TaskId, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Char('c') => {
                self.board.signal_completed(id);
                self.mode = Mode::Board;
                self.board.consume_handoff();
            }
            KeyCode::Esc | KeyCode::Char('q') => self.mode = Mode::Board,
            _ => {}
        }
    }

    fn handle_report_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('c') => self.copy_report(),
            KeyCode::Char('d') => {
                self.board.dismiss_report();
                self.mode = Mode::Board;
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.mode = Mode::Board,
            _ => {}
        }
    }

    fn copy_report(&mut self) {
        let Some(report) = self.board.report() else {
            return;
        };
        let text = ui::report_text(report);
        let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match result {
            Ok(()) => self.show_toast(NoticeLevel::Success, "Copied to clipboard"),
            Err(e) => {
                tracing::warn!("clipboard unavailable: {e}");
                self.show_toast(NoticeLevel::Error, "Clipboard unavailable");
            }
        }
    }

    fn handle_sounds_key(&mut self, code: KeyCode) {
        let last = SoundTrigger::ALL.len() - 1;
        match code {
            KeyCode::Char('j') | KeyCode::Down => self.sound_index = (self.sound_index + 1).min(last),
            KeyCode::Char('k') | KeyCode::Up => self.sound_index = self.sound_index.saturating_sub(1),
            KeyCode::Enter | KeyCode::Char('e') => {
                let trigger = self.selected_trigger();
                self.input_buffer = self
                    .board
                    .sound_preferences()
                    .get(trigger)
                    .unwrap_or_default()
                    .to_string();
                self.input_cursor = self.input_buffer.len();
                self.mode = Mode::EditSound(trigger);
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                let trigger = self.selected_trigger();
                self.board.clear_sound(trigger);
            }
            KeyCode::Char('t') => {
                let trigger = self.selected_trigger();
                sound::play_trigger(self.player.as_ref(), self.board.sound_preferences(), trigger);
            }
            KeyCode::Esc | KeyCode::Char('q') => self.mode = Mode::Board,
            _ => {}
        }
    }

    fn handle_edit_sound_key(&mut self, trigger: SoundTrigger, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Enter => {
                let sound_id = std::mem::take(&mut self.input_buffer);
                self.board.set_sound(trigger, sound_id.trim());
                self.input_cursor = 0;
                self.mode = Mode::Sounds;
            }
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.input_cursor = 0;
                self.mode = Mode::Sounds;
            }
            _ => {
                form::apply_text_edit(&mut self.input_buffer, &mut self.input_cursor, code, modifiers);
            }
        }
    }

    fn handle_confirm_reset_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Char('y' | 'Y')) {
            self.board.reset();
            self.task_index = 0;
            self.show_toast(NoticeLevel::Info, "Board reset");
        }
        self.mode = Mode::Board;
    }
}
