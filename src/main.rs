use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use actionboard::ai::{AiError, AnthropicPrioritizer, PrioritizedTasks, Prioritizer};
use actionboard::board::{Activation, AiState, Board, Effect, NoticeLevel, SoundTrigger, TaskId};
use actionboard::config::{self, Config};
use actionboard::sound::{self, CommandPlayer, SoundPlayer};
use actionboard::store::Store;
use actionboard::tui;

#[derive(Parser)]
#[command(
    name = "actionboard",
    about = "A checklist that celebrates completion and asks an AI for priorities",
    version = actionboard::VERSION
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the TUI board (default)
    Dashboard {
        /// Completion signal from the single-action view
        #[arg(long)]
        completed_task: Option<TaskId>,
    },
    /// Initialize the ~/.actionboard directory
    Init,
    /// List tasks and progress
    List,
    /// Activate a task as if it were clicked on the board
    Activate {
        /// Task id
        id: TaskId,
    },
    /// Complete a navigate-and-complete task
    Complete {
        /// Task id
        id: TaskId,
    },
    /// Ask the AI to prioritize the remaining tasks
    Prioritize,
    /// Mark every task incomplete
    Reset,
    /// Manage sound preferences
    Sounds {
        #[command(subcommand)]
        action: Option<SoundsAction>,
    },
}

#[derive(Subcommand)]
enum SoundsAction {
    /// Show the sound chosen for each trigger (default)
    List,
    /// Choose a sound for a trigger (checkbox, trigger, celebration)
    Set { trigger: SoundTrigger, sound: String },
    /// Silence a trigger
    Clear { trigger: SoundTrigger },
}

/// Stands in when the AI client cannot be built, so the board still opens and
/// the failure surfaces as a normal notice on use.
struct Unavailable(String);

impl Prioritizer for Unavailable {
    fn prioritize(&self, _tasks: &[String]) -> Result<PrioritizedTasks, AiError> {
        Err(AiError::NotConfigured(self.0.clone()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Dashboard {
        completed_task: None,
    });

    if matches!(command, Commands::Init) {
        config::ensure_dirs()?;
        println!("actionboard initialized at ~/.actionboard/");
        return Ok(());
    }

    config::ensure_dirs()?;
    init_logging()?;
    let cfg = config::load()?;
    let player = CommandPlayer::new(cfg.sound.clone(), config::sounds_dir()?);
    let mut board = open_board(&cfg)?;
    let mut failed = false;

    match command {
        // Handled before the board opens.
        Commands::Init => {}
        Commands::Dashboard { completed_task } => {
            let theme = cfg.theme.build();
            return tui::run(board, Box::new(player), theme, completed_task);
        }
        Commands::List => print_tasks(&board),
        Commands::Activate { id } => {
            let outcome = board.activate(id);
            emit(&mut board, &player);
            match outcome {
                Activation::Ignored => println!("Nothing to do for task {id}."),
                Activation::Completed | Activation::NothingToPrioritize => {
                    println!("Completed task {id}.");
                }
                Activation::Navigate(target) => {
                    println!("Task {target} opens its action view. Finish it with `actionboard complete {target}`.");
                }
                Activation::Prioritizing => {
                    failed = !await_prioritization(&mut board, &cfg, &player, id);
                }
            }
        }
        Commands::Complete { id } => {
            board.signal_completed(id);
            if board.consume_handoff() {
                println!("Completed task {id}.");
            } else {
                println!("Nothing to do for task {id}.");
            }
            emit(&mut board, &player);
        }
        Commands::Prioritize => {
            let ai_task = board
                .tasks()
                .iter()
                .find(|t| t.behavior == actionboard::board::Behavior::AiPrioritize && !t.completed)
                .map(|t| t.id);
            match ai_task {
                None => println!("No open prioritization task."),
                Some(id) => {
                    let outcome = board.activate(id);
                    emit(&mut board, &player);
                    if outcome == Activation::Prioritizing {
                        failed = !await_prioritization(&mut board, &cfg, &player, id);
                    }
                }
            }
        }
        Commands::Reset => {
            board.reset();
            emit(&mut board, &player);
            println!("Board reset.");
        }
        Commands::Sounds { action } => match action.unwrap_or(SoundsAction::List) {
            SoundsAction::List => {
                for trigger in SoundTrigger::ALL {
                    let chosen = board.sound_preferences().get(trigger).unwrap_or("(none)");
                    println!("  {:<12} {chosen}", trigger.as_str());
                }
            }
            SoundsAction::Set { trigger, sound } => {
                board.set_sound(trigger, &sound);
                println!("Sound for '{}' set to '{}'.", trigger.as_str(), sound.trim());
            }
            SoundsAction::Clear { trigger } => {
                board.clear_sound(trigger);
                println!("Sound for '{}' cleared.", trigger.as_str());
            }
        },
    }

    board.flush();
    if failed {
        bail!("prioritization did not complete");
    }
    Ok(())
}

fn open_board(cfg: &Config) -> Result<Board> {
    let store = Store::open()?;
    store.migrate()?;
    let defaults = cfg.default_tasks()?;
    let prioritizer: Arc<dyn Prioritizer> = match AnthropicPrioritizer::from_config(&cfg.ai) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!("AI client unavailable: {e}");
            Arc::new(Unavailable(e.to_string()))
        }
    };
    Ok(Board::open(store, defaults, prioritizer))
}

/// Log to ~/.actionboard/actionboard.log; the terminal belongs to the TUI.
fn init_logging() -> Result<()> {
    let path = config::log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("ACTIONBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_tasks(board: &Board) {
    for task in board.tasks() {
        println!(
            "  {} {:>3}  {} ({})",
            task.symbol(),
            task.id,
            task.label,
            task.behavior.as_str(),
        );
    }
    println!("Progress: {}%", board.progress_percent());
}

/// Block until the request settles and print the result. Returns `false` if
/// it failed or never answered.
fn await_prioritization(board: &mut Board, cfg: &Config, player: &dyn SoundPlayer, id: TaskId) -> bool {
    println!("Asking the AI to prioritize...");
    // Allow for the client timeout plus thread scheduling.
    let budget = Duration::from_secs(cfg.ai.timeout_secs + 5);
    if !board.wait_for_ai(budget) {
        println!("Still waiting on the AI service; giving up.");
        return false;
    }
    emit(board, player);

    if let Some(report) = board.report() {
        for (i, label) in report.ordered_labels.iter().enumerate() {
            println!("  {}. {label}", i + 1);
        }
        println!("\n{}", report.reasoning);
    }
    !matches!(board.ai_state(id), AiState::Failed { .. })
}

/// Carry out queued board effects for a non-interactive command.
fn emit(board: &mut Board, player: &dyn SoundPlayer) {
    for effect in board.drain_effects() {
        match effect {
            Effect::Play(trigger) => sound::play_trigger(player, board.sound_preferences(), trigger),
            Effect::Celebrate => println!("Job Complete! Great work, time to celebrate!"),
            Effect::Notice(notice) => match notice.level {
                NoticeLevel::Error => eprintln!("{}", notice.message),
                NoticeLevel::Info | NoticeLevel::Success => println!("{}", notice.message),
            },
            Effect::ClearCelebration | Effect::ReportReady => {}
        }
    }
}
