use berth::application::{BuildObserver, StageOutcome};
use berth::domain::{BuildError, StageKind};
use std::cell::RefCell;

use crate::ui::components::Spinner;
use crate::ui::{Icon, Theme};

/// One spinner per stage, replaced as the pipeline advances. `Launch` gets a
/// plain line instead: an exec handoff never comes back to finish a spinner.
#[derive(Default)]
pub struct StageProgress {
    current: RefCell<Option<Spinner>>,
}

impl StageProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn task(stage: StageKind) -> String {
        format!(
            "[{}/{}] {}",
            stage.position() + 1,
            StageKind::ORDER.len(),
            stage.label()
        )
    }
}

impl BuildObserver for StageProgress {
    fn stage_started(&self, stage: StageKind) {
        if stage == StageKind::Launch {
            self.current.borrow_mut().take();
            crate::ui::println(format!(
                "{} {}",
                Theme::primary(Icon::Rocket),
                Theme::bold(Self::task(stage))
            ));
            return;
        }
        let spinner = Spinner::new(Self::task(stage));
        *self.current.borrow_mut() = Some(spinner);
    }

    fn stage_finished(&self, _stage: StageKind, outcome: &StageOutcome) {
        match self.current.borrow_mut().take() {
            Some(spinner) if outcome.cached => {
                spinner.cached(format!("{} (cached)", outcome.detail))
            }
            Some(spinner) => spinner.success(&outcome.detail),
            None => crate::ui::success(Theme::muted(&outcome.detail)),
        }
    }

    fn stage_failed(&self, stage: StageKind, error: &BuildError) {
        match self.current.borrow_mut().take() {
            Some(spinner) => spinner.fail(error.to_string()),
            None => crate::ui::println(format!(
                "{} {}",
                Theme::error(Self::task(stage)),
                error
            )),
        }
    }
}
