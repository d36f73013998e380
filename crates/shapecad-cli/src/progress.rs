use indicatif::{ProgressBar, ProgressStyle};
use shapecad_core::models::PipelineState;
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Spinner that follows the conversion pipeline through its states
pub struct ConversionProgress {
    bar: ProgressBar,
}

impl ConversionProgress {
    /// A hidden spinner keeps JSON output clean
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            create_spinner(state_message(PipelineState::Idle))
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// State observer to hand to the converter
    pub fn observer(&self) -> impl Fn(PipelineState) + Send + Sync + 'static {
        let bar = self.bar.clone();
        move |state| {
            if !state.is_terminal() {
                bar.set_message(state_message(state));
            }
        }
    }

    pub fn finish_success(&self, message: &str) {
        finish_success(&self.bar, message);
    }

    pub fn finish_error(&self, message: &str) {
        finish_error(&self.bar, message);
    }
}

fn state_message(state: PipelineState) -> &'static str {
    match state {
        PipelineState::Idle => "Starting...",
        PipelineState::Reading => "Reading input...",
        PipelineState::Classifying => "Classifying geometries...",
        PipelineState::ResolvingCrs => "Resolving coordinate system...",
        PipelineState::Writing => "Writing output...",
        PipelineState::Done => "Done",
        PipelineState::Failed => "Failed",
    }
}
