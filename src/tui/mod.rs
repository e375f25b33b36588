mod app;
mod confetti;
mod event;
mod form;
mod keymap;
pub mod theme;
mod ui;

use anyhow::Result;

use crate::board::{Board, TaskId};
use crate::sound::SoundPlayer;

pub use theme::{Theme, ThemeConfig};

/// Run the interactive board until the user quits. `completed_task` is a
/// completion signal handed over from the command line.
pub fn run(
    board: Board,
    player: Box<dyn SoundPlayer>,
    theme: Theme,
    completed_task: Option<TaskId>,
) -> Result<()> {
    let mut terminal = ratatui::init();
    let mut app = app::App::new(board, player, theme, completed_task);
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
