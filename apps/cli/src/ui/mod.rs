use indicatif::MultiProgress;
use std::sync::OnceLock;

pub mod components;
pub mod diagnostic;
pub mod progress;
pub mod theme;

pub use theme::{Icon, Theme};

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

pub fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(MultiProgress::new)
}

pub fn info(message: impl AsRef<str>) {
    println(format!("{} {}", Theme::primary(Icon::Info), message.as_ref()));
}

pub fn warn(message: impl AsRef<str>) {
    println(format!("{} {}", Theme::warning(Icon::Warning), message.as_ref()));
}

pub fn success(message: impl AsRef<str>) {
    println(format!("{} {}", Theme::success(Icon::Check), message.as_ref()));
}

/// Prints above any live spinners; plain stdout when progress output is hidden.
pub fn println(message: impl AsRef<str>) {
    let mp = multi_progress();
    if mp.is_hidden() || mp.println(message.as_ref()).is_err() {
        println!("{}", message.as_ref());
    }
}
