//! Console rendering of pipeline events.

use crate::pipeline::PipelineEvent;
use std::io::{self, Write};

/// Number of slots in the level bar.
const LEVEL_BAR_SLOTS: usize = 20;

/// Formats a 0–100% level as a fixed-width bar, e.g. `████░░░░░░░░░░░░░░░░`.
pub fn format_level_bar(percent: f32) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * LEVEL_BAR_SLOTS as f32).round() as usize;
    let mut bar = String::with_capacity(LEVEL_BAR_SLOTS * 3);
    for slot in 0..LEVEL_BAR_SLOTS {
        bar.push(if slot < filled { '█' } else { '░' });
    }
    bar
}

/// Renders pipeline events to the terminal.
///
/// Level metering rewrites a single line in place; captions and translations
/// each get their own line. In quiet mode only errors are shown.
pub struct ConsoleRenderer {
    quiet: bool,
    /// True while the level line is the last thing written, so the next full
    /// line knows to break out of it first.
    on_meter_line: bool,
}

impl ConsoleRenderer {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            on_meter_line: false,
        }
    }

    pub fn render(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Level { percent } => {
                if self.quiet {
                    return;
                }
                print!("\r[{}] {:5.1}%  ", format_level_bar(*percent), percent);
                let _ = io::stdout().flush();
                self.on_meter_line = true;
            }
            PipelineEvent::Caption { text, confidence } => {
                self.break_meter_line();
                if !self.quiet {
                    println!("  {} ({:.0}%)", text, confidence * 100.0);
                }
            }
            PipelineEvent::Translation { text, .. } => {
                self.break_meter_line();
                if !self.quiet {
                    println!("» {}", text);
                }
            }
            PipelineEvent::Status { stage, message } => {
                log::debug!("[{}] {}", stage, message);
            }
            PipelineEvent::WindowEmitted { samples } => {
                log::debug!("emitted output window ({} samples)", samples);
            }
            PipelineEvent::Error { stage, message } => {
                self.break_meter_line();
                eprintln!("error in {}: {}", stage, message);
            }
        }
    }

    fn break_meter_line(&mut self) {
        if self.on_meter_line {
            println!();
            self.on_meter_line = false;
        }
    }
}
