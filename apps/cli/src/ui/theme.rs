use owo_colors::OwoColorize;
use std::fmt;

/// Colour palette shared by every command.
pub struct Theme;

impl Theme {
    /// Stage names and headings.
    pub fn primary(text: impl fmt::Display) -> String {
        format!("{}", text.cyan().bold())
    }

    pub fn bold(text: impl fmt::Display) -> String {
        format!("{}", text.bold())
    }

    pub fn success(text: impl fmt::Display) -> String {
        format!("{}", text.green().bold())
    }

    pub fn warning(text: impl fmt::Display) -> String {
        format!("{}", text.yellow().bold())
    }

    pub fn error(text: impl fmt::Display) -> String {
        format!("{}", text.red().bold())
    }

    /// Details, paths, cache notes.
    pub fn muted(text: impl fmt::Display) -> String {
        format!("{}", text.dimmed())
    }
}

pub enum Icon {
    Package,
    Rocket,
    Check,
    Cross,
    Cached,
    Info,
    Warning,
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self {
            Icon::Package => "📦",
            Icon::Rocket => "🚀",
            Icon::Check => "✔",
            Icon::Cross => "✖",
            Icon::Cached => "↺",
            Icon::Info => "ℹ",
            Icon::Warning => "⚠",
        };
        write!(f, "{}", icon)
    }
}
