use serde::Serialize;

/// Counters gathered while sweeping the windows of one series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepStats {
    /// Outer-loop steps (distinct window starts) completed.
    pub outer_steps: usize,
    pub windows_scored: usize,
    /// Windows rejected as degenerate.
    pub windows_degenerate: usize,
    /// Inner loops cut short by a break.
    pub break_stops: usize,
    /// Chunks the window starts were split into.
    pub chunks: usize,
    pub elapsed_ms: f64,
}

impl SweepStats {
    /// Accumulate counters of a chunk processed independently.
    pub fn absorb(&mut self, other: &SweepStats) {
        self.outer_steps += other.outer_steps;
        self.windows_scored += other.windows_scored;
        self.windows_degenerate += other.windows_degenerate;
        self.break_stops += other.break_stops;
        self.chunks += other.chunks;
    }
}

/// Summary of one processed boundary surface.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceDiagnostics {
    pub surface: String,
    pub input_points: usize,
    pub usable_points: usize,
    pub breaks: usize,
    pub bias_correction: bool,
    /// Samples that received a winning window.
    pub assigned: usize,
    pub sweep: SweepStats,
}
