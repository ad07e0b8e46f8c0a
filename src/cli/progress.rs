//! Progress display for table materialization
//!
//! Enrichment visits every product's detail page, which takes a while on a
//! cold cache. A single indicatif bar reports products processed; it is hidden
//! when stderr is not a terminal or output is suppressed.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::errors::{AppError, Result};

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg:<10} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable visual progress bars
    pub enable_progress_bars: bool,
    /// Redraw interval of the spinner
    pub tick_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            tick_interval: Duration::from_millis(120),
        }
    }
}

impl ProgressConfig {
    /// Whether a bar would actually be drawn
    pub fn is_visible(&self) -> bool {
        self.enable_progress_bars && atty::is(atty::Stream::Stderr)
    }

    /// Bar for per-product enrichment progress
    ///
    /// The bar starts empty; the materializer sets its length per stage.
    pub fn enrichment_bar(&self) -> Result<ProgressBar> {
        if !self.is_visible() {
            return Ok(ProgressBar::hidden());
        }

        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .map_err(|e| AppError::generic(format!("Progress bar template error: {}", e)))?
                .progress_chars("##-"),
        );
        bar.enable_steady_tick(self.tick_interval);
        Ok(bar)
    }
}
