//! Time management utilities

use std::time::Instant;

/// Monotonic clock measuring seconds since creation
///
/// The frame pipeline feeds these timestamps to `Renderable::update` and to the
/// performance monitor.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Seconds elapsed since the timer was created
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Frame rate monitor reporting an averaged FPS at a fixed interval
///
/// Call [`PerfMonitor::update`] once per frame with the current time. When at
/// least `report_interval` seconds have passed since the previous report, the
/// frames counted in that window are averaged and returned.
#[derive(Debug, Clone)]
pub struct PerfMonitor {
    report_interval: f64,
    window_start: Option<f64>,
    frames_in_window: u32,
    current_time: f64,
    last_fps: f32,
}

impl Default for PerfMonitor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PerfMonitor {
    /// Create a monitor that reports every `report_interval` seconds
    pub fn new(report_interval: f64) -> Self {
        Self {
            report_interval: report_interval.max(f64::EPSILON),
            window_start: None,
            frames_in_window: 0,
            current_time: 0.0,
            last_fps: 0.0,
        }
    }

    /// Record a frame at `now`; returns the averaged FPS when a report is due
    pub fn update(&mut self, now: f64) -> Option<f32> {
        self.current_time = now;
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames_in_window += 1;
        let elapsed = now - start;
        if elapsed < self.report_interval {
            return None;
        }

        let fps = (f64::from(self.frames_in_window) / elapsed) as f32;
        self.last_fps = fps;
        self.frames_in_window = 0;
        self.window_start = Some(now);
        Some(fps)
    }

    /// Time passed to the most recent update, in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Most recently reported FPS (0 until the first report)
    pub fn last_fps(&self) -> f32 {
        self.last_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_only_opens_window() {
        let mut monitor = PerfMonitor::new(1.0);
        assert_eq!(monitor.update(10.0), None);
        assert_eq!(monitor.current_time(), 10.0);
    }

    #[test]
    fn test_reports_average_after_interval() {
        let mut monitor = PerfMonitor::new(1.0);
        monitor.update(0.0);
        let mut report = None;
        for frame in 1..=60 {
            report = monitor.update(f64::from(frame) / 60.0);
            if frame < 60 {
                assert_eq!(report, None);
            }
        }
        let fps = report.expect("report due after one second");
        assert!((fps - 60.0).abs() < 0.01);
        assert!((monitor.last_fps() - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_window_resets_after_report() {
        let mut monitor = PerfMonitor::new(0.5);
        monitor.update(0.0);
        assert!(monitor.update(0.5).is_some());
        assert_eq!(monitor.update(0.6), None);
        let fps = monitor.update(1.0).expect("second report");
        assert!((fps - 4.0).abs() < 0.01);
    }
}
