//! Sliding-window frame-rate monitor with a one-shot downgrade latch.
//!
//! A render surface feeds one frame delta per drawn frame. Once the window
//! is full and its average frame rate falls below the threshold, the monitor
//! latches, notifies its [`DowngradeBus`] once, and keeps answering `false`
//! until [`PerformanceMonitor::reset`].

mod notify;

use std::collections::VecDeque;

pub use notify::{DowngradeBus, DowngradeEvent, Subscription, DOWNGRADE_EVENT};
use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`PerformanceMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceOptions {
    /// Minimum acceptable average FPS.
    pub fps_threshold: f64,
    /// Window size in frames (120 is roughly two seconds at 60 FPS).
    pub sample_size: usize,
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        Self {
            fps_threshold: 55.0,
            sample_size: 120,
        }
    }
}

/// Rolling FPS tracker. One per render surface.
#[derive(Debug)]
pub struct PerformanceMonitor {
    frame_times: VecDeque<f64>,
    fps_threshold: f64,
    sample_size: usize,
    triggered: bool,
    last_avg_fps: Option<f64>,
    bus: DowngradeBus,
}

impl PerformanceMonitor {
    /// Create a monitor that notifies a private bus.
    #[must_use]
    pub fn new(options: PerformanceOptions) -> Self {
        Self::with_bus(options, DowngradeBus::new())
    }

    /// Create a monitor that notifies `bus`, which may be shared with other
    /// monitors or forwarded to page-level listeners.
    #[must_use]
    pub fn with_bus(options: PerformanceOptions, bus: DowngradeBus) -> Self {
        let sample_size = options.sample_size.max(1);
        Self {
            frame_times: VecDeque::with_capacity(sample_size),
            fps_threshold: options.fps_threshold,
            sample_size,
            triggered: false,
            last_avg_fps: None,
            bus,
        }
    }

    /// The bus this monitor notifies on downgrade.
    pub fn bus(&self) -> &DowngradeBus {
        &self.bus
    }

    /// Record the latest frame delta in milliseconds.
    ///
    /// Returns `true` while performance is acceptable (or the window is not
    /// yet full) and `false` once the downgrade has fired. Negative and
    /// non-finite deltas are recorded as zero.
    pub fn record_frame(&mut self, delta_ms: f64) -> bool {
        if self.triggered {
            return false;
        }

        let delta_ms = if delta_ms.is_finite() && delta_ms > 0.0 {
            delta_ms
        } else {
            0.0
        };
        self.frame_times.push_back(delta_ms);
        while self.frame_times.len() > self.sample_size {
            let _ = self.frame_times.pop_front();
        }

        if self.frame_times.len() < self.sample_size {
            return true;
        }

        let avg_frame_time =
            self.frame_times.iter().sum::<f64>() / self.sample_size as f64;
        if avg_frame_time <= 0.0 {
            return true;
        }
        let avg_fps = 1000.0 / avg_frame_time;
        self.last_avg_fps = Some(avg_fps);

        if avg_fps < self.fps_threshold {
            self.triggered = true;
            let event = DowngradeEvent {
                avg_fps: (avg_fps * 10.0).round() / 10.0,
            };
            log::warn!(
                "average frame rate {:.1} FPS below threshold {:.1}, downgrading",
                event.avg_fps,
                self.fps_threshold
            );
            self.bus.emit(&event);
            return false;
        }

        true
    }

    /// Clear the window and re-arm the trigger.
    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.triggered = false;
        self.last_avg_fps = None;
    }

    /// Whether the downgrade has fired since the last reset.
    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Average FPS of the most recent full window, if one has been judged.
    pub fn last_average_fps(&self) -> Option<f64> {
        self.last_avg_fps
    }

    /// Number of frames currently in the window.
    pub fn window_len(&self) -> usize {
        self.frame_times.len()
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(PerformanceOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const SLOW_FRAME_MS: f64 = 1000.0 / 30.0;
    const FAST_FRAME_MS: f64 = 1000.0 / 60.0;

    fn watched(
        options: PerformanceOptions,
    ) -> (PerformanceMonitor, Rc<RefCell<Vec<f64>>>, Subscription) {
        let monitor = PerformanceMonitor::new(options);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let sub = monitor
            .bus()
            .subscribe(move |event| sink.borrow_mut().push(event.avg_fps));
        (monitor, events, sub)
    }

    #[test]
    fn partial_window_never_triggers() {
        let (mut monitor, events, _sub) = watched(PerformanceOptions::default());
        for _ in 0..119 {
            assert!(monitor.record_frame(SLOW_FRAME_MS));
        }
        assert!(!monitor.triggered());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn full_bad_window_triggers_on_last_frame() {
        let (mut monitor, events, _sub) = watched(PerformanceOptions::default());
        for _ in 0..119 {
            assert!(monitor.record_frame(SLOW_FRAME_MS));
        }
        assert!(!monitor.record_frame(SLOW_FRAME_MS));
        assert!(monitor.triggered());
        assert_eq!(*events.borrow(), [30.0]);
    }

    #[test]
    fn healthy_frames_keep_running() {
        let mut monitor = PerformanceMonitor::default();
        for _ in 0..500 {
            assert!(monitor.record_frame(FAST_FRAME_MS));
        }
        assert_eq!(monitor.window_len(), 120);
        let fps = monitor.last_average_fps().unwrap();
        assert!((fps - 60.0).abs() < 1e-6);
    }

    #[test]
    fn latch_suppresses_repeat_notifications_until_reset() {
        let options = PerformanceOptions {
            fps_threshold: 55.0,
            sample_size: 10,
        };
        let (mut monitor, events, _sub) = watched(options);
        for _ in 0..10 {
            let _ = monitor.record_frame(SLOW_FRAME_MS);
        }
        assert!(monitor.triggered());
        for _ in 0..50 {
            assert!(!monitor.record_frame(SLOW_FRAME_MS));
        }
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(monitor.window_len(), 10);

        monitor.reset();
        assert!(!monitor.triggered());
        assert_eq!(monitor.window_len(), 0);
        for _ in 0..9 {
            assert!(monitor.record_frame(SLOW_FRAME_MS));
        }
        assert!(!monitor.record_frame(SLOW_FRAME_MS));
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn window_slides_fifo() {
        let options = PerformanceOptions {
            fps_threshold: 55.0,
            sample_size: 4,
        };
        let mut monitor = PerformanceMonitor::new(options);
        // One terrible frame followed by good ones: it must age out.
        assert!(monitor.record_frame(100.0));
        for _ in 0..3 {
            let _ = monitor.record_frame(1.0);
        }
        assert!(monitor.triggered());

        let mut monitor = PerformanceMonitor::new(options);
        for _ in 0..3 {
            assert!(monitor.record_frame(1.0));
        }
        assert!(monitor.record_frame(1.0));
        assert!(monitor.record_frame(1.0));
        assert!(!monitor.triggered());
    }

    #[test]
    fn zero_deltas_are_safe() {
        let options = PerformanceOptions {
            fps_threshold: 55.0,
            sample_size: 2,
        };
        let mut monitor = PerformanceMonitor::new(options);
        assert!(monitor.record_frame(0.0));
        assert!(monitor.record_frame(0.001));
        let fps = monitor.last_average_fps().unwrap();
        assert!(fps.is_finite());

        let mut all_zero = PerformanceMonitor::new(options);
        for _ in 0..10 {
            assert!(all_zero.record_frame(0.0));
        }
        assert!(all_zero.last_average_fps().is_none());
        assert!(!all_zero.triggered());
    }

    #[test]
    fn degenerate_deltas_are_clamped() {
        let options = PerformanceOptions {
            fps_threshold: 55.0,
            sample_size: 3,
        };
        let mut monitor = PerformanceMonitor::new(options);
        assert!(monitor.record_frame(-50.0));
        assert!(monitor.record_frame(f64::NAN));
        assert!(monitor.record_frame(f64::INFINITY));
        assert!(!monitor.triggered());
    }

    #[test]
    fn shared_bus_reaches_external_listeners() {
        let bus = DowngradeBus::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = bus.subscribe(move |_| *counter.borrow_mut() += 1);
        let options = PerformanceOptions {
            fps_threshold: 55.0,
            sample_size: 1,
        };
        let mut a = PerformanceMonitor::with_bus(options, bus.clone());
        let mut b = PerformanceMonitor::with_bus(options, bus);
        assert!(!a.record_frame(SLOW_FRAME_MS));
        assert!(!b.record_frame(SLOW_FRAME_MS));
        assert_eq!(*hits.borrow(), 2);
    }
}
