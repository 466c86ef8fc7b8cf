use crate::ui::{Icon, Theme};
use indicatif::{ProgressBar, ProgressStyle};

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(task: impl Into<String>) -> Self {
        let pb = crate::ui::multi_progress().add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
            .template("{spinner:.cyan} {prefix:.bold} {msg:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_prefix(task.into());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { pb }
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.finish(Theme::success(Icon::Check), msg.into());
    }

    pub fn cached(&self, msg: impl Into<String>) {
        self.finish(Theme::muted(Icon::Cached), msg.into());
    }

    pub fn fail(&self, msg: impl Into<String>) {
        self.finish(Theme::error(Icon::Cross), msg.into());
    }

    fn finish(&self, icon: String, msg: String) {
        self.pb.set_style(
            ProgressStyle::with_template("{prefix:.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        let prefix = self.pb.prefix();
        self.pb.set_prefix(format!("{} {}", icon, prefix));
        self.pb.finish_with_message(Theme::muted(msg));
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
