//! Keybinding registry: maps actions to key events with config overrides.
//!
//! Defaults are registered per context; `[keybindings]` in config.toml can
//! rebind any action by name.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    Top,
    Bottom,
    NextCategory,
    PrevCategory,
    Refresh,
    Open,
    ToggleFavorite,
    ToggleRead,
    ToggleFavoritesOnly,
    ShowHelp,
    Back,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::Top => "Jump to first headline",
            Self::Bottom => "Jump to last headline",
            Self::NextCategory => "Next category",
            Self::PrevCategory => "Previous category",
            Self::Refresh => "Reload category / retry",
            Self::Open => "Open in browser",
            Self::ToggleFavorite => "Toggle favorite",
            Self::ToggleRead => "Toggle read",
            Self::ToggleFavoritesOnly => "Show favorites only",
            Self::ShowHelp => "Show help",
            Self::Back => "Go back / dismiss",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Help,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Named keys accepted in config, and how they are displayed in help.
const NAMED_KEYS: [(&str, KeyCode); 13] = [
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Tab", KeyCode::Tab),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Backspace", KeyCode::Backspace),
    ("Space", KeyCode::Char(' ')),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
];

/// Parse a config key string: a single character, a named key from
/// [`NAMED_KEYS`] (case-insensitive, plus "Return"/"Escape"), `F1`..`F12`,
/// or `Ctrl+<char>`.
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let lower = s.to_ascii_lowercase();
    let alias = match lower.as_str() {
        "return" => "enter",
        "escape" => "esc",
        other => other,
    };
    if let Some((_, code)) = NAMED_KEYS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(alias))
    {
        return Some(KeySpec::plain(*code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=12).contains(n))
    {
        return Some(KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::plain(KeyCode::Char(c))),
        _ => None,
    }
}

/// Display form of a key, e.g. `Ctrl+d`, `Space`, `F5`.
fn format_key(key: &KeySpec) -> String {
    let name = match key.code {
        KeyCode::F(n) => format!("F{n}"),
        code => match NAMED_KEYS.iter().find(|(_, c)| *c == code) {
            Some((name, _)) => (*name).to_string(),
            None => match code {
                KeyCode::Char(c) => c.to_string(),
                _ => "?".to_string(),
            },
        },
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{name}")
    } else {
        name
    }
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to `Global`.
pub struct KeybindingRegistry {
    /// Primary lookup: (Context, KeySpec) -> Action
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings for help screen enumeration
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    /// Create a registry with the default bindings.
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use KeyCode::*;

        let global = [
            (KeySpec::plain(Char('q')), Action::Quit),
            (KeySpec::ctrl('c'), Action::Quit),
            (KeySpec::plain(Char('j')), Action::NavDown),
            (KeySpec::plain(Down), Action::NavDown),
            (KeySpec::plain(Char('k')), Action::NavUp),
            (KeySpec::plain(Up), Action::NavUp),
            (KeySpec::ctrl('d'), Action::PageDown),
            (KeySpec::plain(PageDown), Action::PageDown),
            (KeySpec::ctrl('u'), Action::PageUp),
            (KeySpec::plain(PageUp), Action::PageUp),
            (KeySpec::plain(Char('g')), Action::Top),
            (KeySpec::plain(Home), Action::Top),
            (KeySpec::plain(Char('G')), Action::Bottom),
            (KeySpec::plain(End), Action::Bottom),
            (KeySpec::plain(Char('l')), Action::NextCategory),
            (KeySpec::plain(Right), Action::NextCategory),
            (KeySpec::plain(Tab), Action::NextCategory),
            (KeySpec::plain(Char('h')), Action::PrevCategory),
            (KeySpec::plain(Left), Action::PrevCategory),
            (KeySpec::plain(Char('r')), Action::Refresh),
            (KeySpec::plain(Enter), Action::Open),
            (KeySpec::plain(Char('o')), Action::Open),
            (KeySpec::plain(Char('f')), Action::ToggleFavorite),
            (KeySpec::plain(Char('m')), Action::ToggleRead),
            (KeySpec::plain(Char('F')), Action::ToggleFavoritesOnly),
            (KeySpec::plain(Char('?')), Action::ShowHelp),
            (KeySpec::plain(Esc), Action::Back),
        ];
        for (key, action) in global {
            self.bind(Context::Global, key, action);
        }

        // Help overlay: scroll with the nav keys, close with Esc/q/?
        let help = [
            (KeySpec::plain(Esc), Action::Back),
            (KeySpec::plain(Char('q')), Action::Back),
            (KeySpec::plain(Char('?')), Action::Back),
        ];
        for (key, action) in help {
            self.bind(Context::Help, key, action);
        }
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "nav_down").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        // Sorted so that repeated runs resolve conflicting overrides the same way
        let mut entries: Vec<_> = overrides.iter().collect();
        entries.sort();

        for (action_name, key_str) in entries {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts_for_action: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts_for_action.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts_for_action {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// Tries the specific context first, then falls back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        // Shifted letters arrive as uppercase chars; the SHIFT bit is noise
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        if context != Context::Global {
            if let Some(&action) = self.lookup.get(&(Context::Global, key)) {
                return Some(action);
            }
        }

        None
    }

    /// Get all bindings for the help screen.
    ///
    /// Returns (context, key_display_string, action, description) tuples.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }

    /// First key bound to `action` in the global context, for status-bar hints.
    pub fn key_hint(&self, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(ctx, _, a)| *ctx == Context::Global && *a == action)
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "navdown" | "down" => Some(Action::NavDown),
        "nav_up" | "navup" | "up" => Some(Action::NavUp),
        "page_down" | "pagedown" => Some(Action::PageDown),
        "page_up" | "pageup" => Some(Action::PageUp),
        "top" | "first" => Some(Action::Top),
        "bottom" | "last" => Some(Action::Bottom),
        "next_category" | "nextcategory" => Some(Action::NextCategory),
        "prev_category" | "prevcategory" | "previous_category" => Some(Action::PrevCategory),
        "refresh" | "retry" => Some(Action::Refresh),
        "open" | "open_in_browser" | "openinbrowser" => Some(Action::Open),
        "toggle_favorite" | "togglefavorite" | "favorite" => Some(Action::ToggleFavorite),
        "toggle_read" | "toggleread" | "read" => Some(Action::ToggleRead),
        "toggle_favorites_only" | "togglefavoritesonly" | "favorites" => {
            Some(Action::ToggleFavoritesOnly)
        }
        "show_help" | "showhelp" | "help" => Some(Action::ShowHelp),
        "back" => Some(Action::Back),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
