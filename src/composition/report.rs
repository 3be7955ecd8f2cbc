//! Outcome of one compositing pass

use crate::models::Warning;
use crate::surface::SurfaceError;

/// What happened during one full redraw of a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeReport {
    /// Blocks successfully handed to the surface
    pub painted: usize,
    /// Blocks the surface rejected
    pub failures: usize,
    pub warnings: Vec<Warning>,
}

/// Rate-limits draw-failure diagnostics within one pass.
#[derive(Debug)]
pub(crate) struct FailureLog {
    cap: usize,
    logged: usize,
    suppressed: usize,
}

impl FailureLog {
    pub(crate) fn new(cap: usize) -> Self {
        Self { cap, logged: 0, suppressed: 0 }
    }

    pub(crate) fn record(&mut self, layer: usize, err: &SurfaceError, report: &mut CompositeReport) {
        report.failures += 1;
        if self.logged < self.cap {
            self.logged += 1;
            tracing::warn!(layer, "failed to draw tile: {err}");
            report.warnings.push(Warning::new(format!("Layer {}: {}", layer, err)));
        } else {
            self.suppressed += 1;
        }
    }

    pub(crate) fn finish(self, report: &mut CompositeReport) {
        if self.suppressed > 0 {
            tracing::warn!(suppressed = self.suppressed, "further tile draw failures not logged");
            report.warnings.push(Warning::new(format!(
                "{} more tile draw failures were not logged",
                self.suppressed
            )));
        }
    }
}
