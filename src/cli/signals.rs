//! Ctrl-C handling while an analysis runs

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::AnalysisControl;

/// What a Ctrl-C press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// First press: stop recording and classify what was captured
    StopEarly,
    /// Second press: abandon the analysis
    Cancel,
}

impl InterruptAction {
    /// Action for the `count`-th press, starting at 1
    pub fn for_press(count: usize) -> Self {
        if count <= 1 {
            Self::StopEarly
        } else {
            Self::Cancel
        }
    }
}

/// Listen for Ctrl-C until the returned task is aborted.
///
/// `on_interrupt` runs after each action is applied, for user feedback.
pub fn spawn_interrupt_handler<F>(control: AnalysisControl, on_interrupt: F) -> JoinHandle<()>
where
    F: Fn(InterruptAction) + Send + 'static,
{
    tokio::spawn(async move {
        let mut presses = 0;
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl-C: {}", e);
                return;
            }
            presses += 1;

            let action = InterruptAction::for_press(presses);
            debug!(?action, "interrupt received");
            match action {
                InterruptAction::StopEarly => control.stop_early(),
                InterruptAction::Cancel => control.cancel(),
            }
            on_interrupt(action);

            if action == InterruptAction::Cancel {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_press_stops_second_cancels() {
        assert_eq!(InterruptAction::for_press(1), InterruptAction::StopEarly);
        assert_eq!(InterruptAction::for_press(2), InterruptAction::Cancel);
        assert_eq!(InterruptAction::for_press(5), InterruptAction::Cancel);
    }
}
