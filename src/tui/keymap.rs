use crossterm::event::{KeyCode, KeyModifiers};

// ── Actions ──────────────────────────────────────────────────────────

/// Every discrete action the board screen can perform in response to a key.
///
/// Actions are context-free identifiers; `App` decides what actually happens
/// based on the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ShowHelp,
    MoveUp,
    MoveDown,
    Activate,
    ShowReport,
    OpenSounds,
    Reset,
}

// ── Help categories ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelpCategory {
    Navigation,
    Tasks,
    Board,
}

impl HelpCategory {
    fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::Tasks => "Tasks",
            Self::Board => "Board",
        }
    }

    /// Fixed display order for the help overlay.
    const ORDERED: &[Self] = &[Self::Navigation, Self::Tasks, Self::Board];
}

// ── Keybinding ───────────────────────────────────────────────────────

/// A single key → action mapping with metadata for the help overlay.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: Action,
    /// Human-readable key label shown in help. Empty hides the row.
    pub label: &'static str,
    pub description: &'static str,
    pub category: HelpCategory,
}

/// A single row in the help overlay.
#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub label: &'static str,
    pub description: &'static str,
}

// ── KeyMap ────────────────────────────────────────────────────────────

/// Declarative registry of the board screen's key bindings. Modals (action
/// view, report, sound editor, confirmations) handle their own few keys.
pub struct KeyMap {
    pub bindings: Vec<KeyBinding>,
}

impl KeyMap {
    pub fn default_keymap() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }

    pub fn lookup(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        // Shift is already encoded in the character ('R', '?').
        let modifiers = if matches!(code, KeyCode::Char(_)) {
            modifiers.difference(KeyModifiers::SHIFT)
        } else {
            modifiers
        };
        self.bindings
            .iter()
            .find(|kb| kb.code == code && kb.modifiers == modifiers)
            .map(|kb| kb.action)
    }

    /// Generate grouped help entries in display order.
    pub fn help_entries(&self) -> Vec<(&'static str, Vec<HelpEntry>)> {
        let mut out = Vec::new();

        for &cat in HelpCategory::ORDERED {
            let mut entries: Vec<HelpEntry> = Vec::new();
            for kb in &self.bindings {
                if kb.category == cat
                    && !kb.description.is_empty()
                    && !entries.iter().any(|e| e.label == kb.label)
                {
                    entries.push(HelpEntry {
                        label: kb.label,
                        description: kb.description,
                    });
                }
            }
            if !entries.is_empty() {
                out.push((cat.label(), entries));
            }
        }

        out
    }
}

// ── Default bindings ─────────────────────────────────────────────────

fn bind(
    code: KeyCode,
    modifiers: KeyModifiers,
    action: Action,
    label: &'static str,
    description: &'static str,
    category: HelpCategory,
) -> KeyBinding {
    KeyBinding {
        code,
        modifiers,
        action,
        label,
        description,
        category,
    }
}

#[allow(clippy::enum_glob_use)]
fn default_bindings() -> Vec<KeyBinding> {
    use Action::*;
    use HelpCategory::*;

    vec![
        // ── Navigation ───────────────────────────────────────────
        bind(KeyCode::Char('j'), KeyModifiers::NONE, MoveDown, "  j/k", "Navigate up/down", Navigation),
        bind(KeyCode::Char('k'), KeyModifiers::NONE, MoveUp, "", "", Navigation),
        bind(KeyCode::Down, KeyModifiers::NONE, MoveDown, "", "", Navigation),
        bind(KeyCode::Up, KeyModifiers::NONE, MoveUp, "", "", Navigation),
        bind(KeyCode::Char('?'), KeyModifiers::NONE, ShowHelp, "  ?", "This help screen", Navigation),
        bind(KeyCode::Char('q'), KeyModifiers::NONE, Quit, "  q", "Quit", Navigation),
        bind(KeyCode::Char('c'), KeyModifiers::CONTROL, Quit, "", "", Navigation),
        // ── Tasks ────────────────────────────────────────────────
        bind(KeyCode::Enter, KeyModifiers::NONE, Activate, "  Enter", "Check / trigger task", Tasks),
        bind(KeyCode::Char(' '), KeyModifiers::NONE, Activate, "  Space", "Check / trigger task", Tasks),
        bind(KeyCode::Char('p'), KeyModifiers::NONE, ShowReport, "  p", "Show last prioritization", Tasks),
        // ── Board ────────────────────────────────────────────────
        bind(KeyCode::Char('s'), KeyModifiers::NONE, OpenSounds, "  s", "Sound preferences", Board),
        bind(KeyCode::Char('R'), KeyModifiers::NONE, Reset, "  R", "Reset board", Board),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_quit() {
        let km = KeyMap::default_keymap();
        assert_eq!(
            km.lookup(KeyCode::Char('q'), KeyModifiers::NONE),
            Some(Action::Quit)
        );
        assert_eq!(
            km.lookup(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Action::Quit)
        );
    }

    #[test]
    fn enter_and_space_activate() {
        let km = KeyMap::default_keymap();
        assert_eq!(km.lookup(KeyCode::Enter, KeyModifiers::NONE), Some(Action::Activate));
        assert_eq!(
            km.lookup(KeyCode::Char(' '), KeyModifiers::NONE),
            Some(Action::Activate)
        );
    }

    #[test]
    fn lowercase_r_does_not_reset() {
        let km = KeyMap::default_keymap();
        assert_eq!(km.lookup(KeyCode::Char('r'), KeyModifiers::NONE), None);
    }

    #[test]
    fn shifted_characters_match() {
        let km = KeyMap::default_keymap();
        assert_eq!(
            km.lookup(KeyCode::Char('R'), KeyModifiers::SHIFT),
            Some(Action::Reset)
        );
        assert_eq!(
            km.lookup(KeyCode::Char('?'), KeyModifiers::SHIFT),
            Some(Action::ShowHelp)
        );
    }

    #[test]
    fn help_entries_cover_all_categories() {
        let km = KeyMap::default_keymap();
        let labels: Vec<&str> = km.help_entries().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["Navigation", "Tasks", "Board"]);
    }

    #[test]
    fn help_entries_no_duplicates() {
        let km = KeyMap::default_keymap();
        for (_, entries) in km.help_entries() {
            let mut seen = std::collections::HashSet::new();
            for e in &entries {
                assert!(seen.insert(e.label), "duplicate help label: {:?}", e.label);
            }
        }
    }
}
