//! # Benchmark Harness
//!
//! Collects per-frame timings for a scene of a given complexity, reduces them
//! to summary statistics and writes the results as JSON artifacts.
//!
//! ## Usage
//!
//! ```no_run
//! use spatial_render::performance::{FrameTimer, PerformanceHarness, Resolution};
//!
//! let mut harness = PerformanceHarness::new();
//! harness.start_benchmark(100, Resolution { width: 1280, height: 720 });
//!
//! for _ in 0..100 {
//!     let mut timer = FrameTimer::start();
//!     timer.begin_render();
//!     // ... record and submit the frame ...
//!     timer.end_render();
//!     // ... wait for the GPU ...
//!     let (frame_us, render_us) = timer.finish();
//!     harness.record_frame(frame_us, render_us);
//! }
//!
//! if let Some(result) = harness.end_benchmark() {
//!     println!("{:.1} fps", result.avg_fps);
//! }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize benchmark results: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Timings and statistics of one benchmark run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub avg_fps: f64,
    pub avg_frame_time_us: f64,
    pub avg_render_time_us: f64,
    /// Population variance of the frame times, in µs²
    pub frame_variance: f64,
    /// Number of objects in the benchmarked scene
    pub scene_complexity: usize,
    pub resolution: Resolution,
    pub frame_times: Vec<f64>,
    pub render_times: Vec<f64>,
}

impl BenchmarkResult {
    /// Fills in the statistics from the recorded samples
    ///
    /// Returns `None` when no frame was recorded.
    fn finalize(mut self) -> Option<Self> {
        if self.frame_times.is_empty() {
            return None;
        }

        let frame_count = self.frame_times.len() as f64;
        self.avg_frame_time_us = self.frame_times.iter().sum::<f64>() / frame_count;
        self.avg_render_time_us = self.render_times.iter().sum::<f64>() / frame_count;
        self.avg_fps = 1_000_000.0 / self.avg_frame_time_us;
        self.frame_variance = self
            .frame_times
            .iter()
            .map(|ft| (ft - self.avg_frame_time_us).powi(2))
            .sum::<f64>()
            / frame_count;

        Some(self)
    }
}

/// Row of the benchmark summary file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummaryEntry {
    pub scene_complexity: usize,
    pub avg_fps: f64,
    pub avg_frame_time_us: f64,
    pub avg_render_time_us: f64,
    pub frame_variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub benchmark_count: usize,
    pub results: Vec<BenchmarkSummaryEntry>,
}

/// Records frame timings and accumulates benchmark results
#[derive(Debug, Default)]
pub struct PerformanceHarness {
    current: Option<BenchmarkResult>,
    results: Vec<BenchmarkResult>,
}

impl PerformanceHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new run, discarding samples of an unfinished one
    pub fn start_benchmark(&mut self, scene_complexity: usize, resolution: Resolution) {
        self.current = Some(BenchmarkResult {
            scene_complexity,
            resolution,
            ..BenchmarkResult::default()
        });
    }

    pub fn is_benchmarking(&self) -> bool {
        self.current.is_some()
    }

    /// Adds one frame sample. Ignored when no run is active.
    pub fn record_frame(&mut self, frame_time_us: f64, render_time_us: f64) {
        if let Some(current) = self.current.as_mut() {
            current.frame_times.push(frame_time_us);
            current.render_times.push(render_time_us);
        }
    }

    /// Finishes the run and stores its result
    ///
    /// A run without recorded frames produces no result.
    pub fn end_benchmark(&mut self) -> Option<&BenchmarkResult> {
        let result = self.current.take()?.finalize()?;
        log::info!(
            "Benchmark {} objects: {:.1} fps ({:.1} us/frame)",
            result.scene_complexity,
            result.avg_fps,
            result.avg_frame_time_us
        );
        self.results.push(result);
        self.results.last()
    }

    /// Most recent completed result
    pub fn result(&self) -> Option<&BenchmarkResult> {
        self.results.last()
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    pub fn summary(&self) -> BenchmarkSummary {
        BenchmarkSummary {
            benchmark_count: self.results.len(),
            results: self
                .results
                .iter()
                .map(|r| BenchmarkSummaryEntry {
                    scene_complexity: r.scene_complexity,
                    avg_fps: r.avg_fps,
                    avg_frame_time_us: r.avg_frame_time_us,
                    avg_render_time_us: r.avg_render_time_us,
                    frame_variance: r.frame_variance,
                })
                .collect(),
        }
    }

    /// Writes `dir/benchmark_<N>_objects.json` and returns its path
    pub fn save_result(
        dir: impl AsRef<Path>,
        result: &BenchmarkResult,
    ) -> Result<PathBuf, BenchmarkError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("benchmark_{}_objects.json", result.scene_complexity));
        fs::write(&path, serde_json::to_string_pretty(result)?)?;
        log::info!("Saved benchmark result: {}", path.display());
        Ok(path)
    }

    /// Writes the summary of every completed run
    pub fn save_summary(&self, path: impl AsRef<Path>) -> Result<(), BenchmarkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_string_pretty(&self.summary())?)?;
        log::info!("Saved benchmark summary: {}", path.display());
        Ok(())
    }
}

/// Measures one frame and the render segment inside it
#[derive(Debug)]
pub struct FrameTimer {
    start: Instant,
    render_start: Option<Instant>,
    render_end: Option<Instant>,
}

impl FrameTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            render_start: None,
            render_end: None,
        }
    }

    pub fn begin_render(&mut self) {
        self.render_start = Some(Instant::now());
    }

    pub fn end_render(&mut self) {
        self.render_end = Some(Instant::now());
    }

    /// Returns `(frame_time_us, render_time_us)`
    pub fn finish(self) -> (f64, f64) {
        let end = Instant::now();
        let micros = |from: Instant, to: Instant| to.duration_since(from).as_secs_f64() * 1_000_000.0;

        let render = match (self.render_start, self.render_end) {
            (Some(from), Some(to)) => micros(from, to),
            _ => 0.0,
        };
        (micros(self.start, end), render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness_with(frames: &[(f64, f64)]) -> PerformanceHarness {
        let mut harness = PerformanceHarness::new();
        harness.start_benchmark(10, Resolution { width: 64, height: 32 });
        for &(frame, render) in frames {
            harness.record_frame(frame, render);
        }
        harness
    }

    #[test]
    fn statistics_follow_recorded_frames() {
        let mut harness = harness_with(&[(1000.0, 400.0), (2000.0, 600.0), (3000.0, 800.0)]);
        let result = harness.end_benchmark().unwrap().clone();

        assert_eq!(result.avg_frame_time_us, 2000.0);
        assert_eq!(result.avg_render_time_us, 600.0);
        assert_eq!(result.avg_fps, 500.0);
        // ((-1000)² + 0 + 1000²) / 3
        assert!((result.frame_variance - 2_000_000.0 / 3.0).abs() < 1e-6);
        assert_eq!(result.scene_complexity, 10);
        assert_eq!(result.frame_times.len(), 3);
        assert!(!harness.is_benchmarking());
    }

    #[test]
    fn empty_run_produces_no_result() {
        let mut harness = harness_with(&[]);
        assert!(harness.end_benchmark().is_none());
        assert!(harness.results().is_empty());
    }

    #[test]
    fn frames_outside_a_run_are_ignored() {
        let mut harness = PerformanceHarness::new();
        harness.record_frame(1.0, 1.0);
        assert!(harness.end_benchmark().is_none());
    }

    #[test]
    fn summary_lists_runs_in_order() {
        let mut harness = PerformanceHarness::new();
        for n in [1usize, 10, 50] {
            harness.start_benchmark(n, Resolution::default());
            harness.record_frame(100.0 * n as f64, 10.0);
            harness.end_benchmark();
        }

        let summary = harness.summary();
        assert_eq!(summary.benchmark_count, 3);
        let complexities: Vec<usize> = summary.results.iter().map(|r| r.scene_complexity).collect();
        assert_eq!(complexities, vec![1, 10, 50]);
    }

    #[test]
    fn results_are_written_as_json() {
        let dir = std::env::temp_dir().join(format!("spatial-render-bench-{}", std::process::id()));
        let mut harness = harness_with(&[(500.0, 100.0), (1500.0, 300.0)]);
        let result = harness.end_benchmark().unwrap().clone();

        let path = PerformanceHarness::save_result(&dir, &result).unwrap();
        assert!(path.ends_with("benchmark_10_objects.json"));
        let loaded: BenchmarkResult =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, result);

        let summary_path = dir.join("summary.json");
        harness.save_summary(&summary_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
        assert_eq!(json["benchmark_count"], 1);
        assert_eq!(json["results"][0]["scene_complexity"], 10);
        assert_eq!(json["results"][0]["avg_fps"], 1000.0);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn frame_timer_reports_render_within_frame() {
        let mut timer = FrameTimer::start();
        timer.begin_render();
        timer.end_render();
        let (frame_us, render_us) = timer.finish();
        assert!(render_us <= frame_us);
        assert!(render_us >= 0.0);
    }
}
