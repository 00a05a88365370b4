//! Animated counters: an eased tween driven by an injected clock.
//!
//! The animation is cooperative. Whoever owns the frame loop calls
//! [`CounterAnimation::frame`] once per frame until it stops returning
//! [`FrameStatus::Running`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default counter animation length
pub const DEFAULT_DURATION: Duration = Duration::from_millis(1000);

/// `1 - (1 - p)^4` with `p` clamped to `[0, 1]`
pub fn ease_out_quart(progress: f64) -> f64 {
    let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    1.0 - (1.0 - p).powi(4)
}

/// How displayed values are rounded on every frame, the last one included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Integer counters
    Floor,
    /// Fixed decimal places, e.g. percentages
    Decimals(u32),
}

impl Rounding {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Rounding::Floor => value.floor(),
            Rounding::Decimals(places) => {
                let factor = 10f64.powi(*places as i32);
                (value * factor).round() / factor
            }
        }
    }
}

/// Injected time source
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Monotonic wall clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Stops an animation. Cloneable, so it can outlive the animation's owner.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of one animation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Running,
    Finished,
    Cancelled,
}

/// One eased run from 0 to `target`
pub struct CounterAnimation<F>
where
    F: FnMut(f64),
{
    target: f64,
    duration: Duration,
    rounding: Rounding,
    clock: Arc<dyn Clock>,
    started_at: Duration,
    tick: F,
    cancel: CancelHandle,
    finished: bool,
}

impl<F> CounterAnimation<F>
where
    F: FnMut(f64),
{
    /// Starts a run at the clock's current time.
    ///
    /// A zero target, or a zero duration, displays the final value
    /// synchronously and the animation is finished before `start` returns.
    pub fn start(target: f64, duration: Duration, rounding: Rounding, clock: Arc<dyn Clock>, mut tick: F) -> Self {
        let started_at = clock.now();
        let finished = target == 0.0 || duration.is_zero();
        if finished {
            tick(rounding.apply(target));
        }
        Self {
            target,
            duration,
            rounding,
            clock,
            started_at,
            tick,
            cancel: CancelHandle::default(),
            finished,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances one frame. After cancellation `tick` is never called again.
    pub fn frame(&mut self) -> FrameStatus {
        if self.cancel.is_cancelled() {
            return FrameStatus::Cancelled;
        }
        if self.finished {
            return FrameStatus::Finished;
        }

        let elapsed = self.clock.now().saturating_sub(self.started_at);
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();

        if progress >= 1.0 {
            self.finished = true;
            (self.tick)(self.rounding.apply(self.target));
            FrameStatus::Finished
        } else {
            let value = self.target * ease_out_quart(progress);
            (self.tick)(self.rounding.apply(value));
            FrameStatus::Running
        }
    }
}

/// Display value that re-animates from zero whenever its target changes
pub struct AnimatedValue {
    display: Arc<Mutex<f64>>,
    duration: Duration,
    rounding: Rounding,
    clock: Arc<dyn Clock>,
    current: Option<CounterAnimation<Box<dyn FnMut(f64) + Send>>>,
}

impl AnimatedValue {
    pub fn new(duration: Duration, rounding: Rounding, clock: Arc<dyn Clock>) -> Self {
        Self {
            display: Arc::new(Mutex::new(0.0)),
            duration,
            rounding,
            clock,
            current: None,
        }
    }

    /// Value currently shown
    pub fn display(&self) -> f64 {
        *self.display.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn target(&self) -> Option<f64> {
        self.current.as_ref().map(|a| a.target())
    }

    /// Points the counter at a new target. An unchanged target keeps the
    /// running animation; a new one cancels it and restarts from zero.
    pub fn set_target(&mut self, target: f64) {
        if self.target() == Some(target) {
            return;
        }
        if let Some(old) = self.current.take() {
            old.cancel_handle().cancel();
        }

        *self.display.lock().unwrap_or_else(|e| e.into_inner()) = 0.0;
        let display = Arc::clone(&self.display);
        let tick: Box<dyn FnMut(f64) + Send> = Box::new(move |value| {
            *display.lock().unwrap_or_else(|e| e.into_inner()) = value;
        });
        self.current = Some(CounterAnimation::start(
            target,
            self.duration,
            self.rounding,
            Arc::clone(&self.clock),
            tick,
        ));
    }

    /// Steps the running animation, if any
    pub fn frame(&mut self) -> FrameStatus {
        match self.current.as_mut() {
            Some(animation) => animation.frame(),
            None => FrameStatus::Finished,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.current.as_ref().map(|a| !a.is_finished()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recorder() -> (Arc<Mutex<Vec<f64>>>, impl FnMut(f64)) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&frames);
        (frames, move |v| sink.lock().unwrap().push(v))
    }

    #[test]
    fn test_easing_curve() {
        assert_eq!(ease_out_quart(0.0), 0.0);
        assert_eq!(ease_out_quart(1.0), 1.0);
        assert_eq!(ease_out_quart(0.5), 0.9375);
        assert_eq!(ease_out_quart(2.0), 1.0);
        assert_eq!(ease_out_quart(-1.0), 0.0);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(Rounding::Floor.apply(41.99), 41.0);
        assert_eq!(Rounding::Decimals(1).apply(62.46), 62.5);
        assert_eq!(Rounding::Decimals(0).apply(2.5), 3.0);
    }

    #[test]
    fn test_converges_to_target() {
        let clock = Arc::new(ManualClock::new());
        let (frames, tick) = recorder();
        let mut animation =
            CounterAnimation::start(1234.0, Duration::from_millis(1000), Rounding::Floor, clock.clone(), tick);

        assert_eq!(animation.frame(), FrameStatus::Running);
        clock.advance(Duration::from_millis(500));
        assert_eq!(animation.frame(), FrameStatus::Running);
        clock.advance(Duration::from_millis(600));
        assert_eq!(animation.frame(), FrameStatus::Finished);
        assert_eq!(animation.frame(), FrameStatus::Finished);

        let frames = frames.lock().unwrap();
        assert_eq!(*frames, vec![0.0, 1156.0, 1234.0]);
    }

    #[test]
    fn test_zero_target_short_circuits() {
        let clock = Arc::new(ManualClock::new());
        let (frames, tick) = recorder();
        let mut animation = CounterAnimation::start(0.0, DEFAULT_DURATION, Rounding::Floor, clock, tick);

        assert!(animation.is_finished());
        assert_eq!(*frames.lock().unwrap(), vec![0.0]);
        assert_eq!(animation.frame(), FrameStatus::Finished);
        assert_eq!(frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_ticks_after_cancel() {
        let clock = Arc::new(ManualClock::new());
        let (frames, tick) = recorder();
        let mut animation =
            CounterAnimation::start(100.0, Duration::from_millis(1000), Rounding::Floor, clock.clone(), tick);
        animation.frame();
        animation.cancel_handle().cancel();

        clock.advance(Duration::from_secs(5));
        assert_eq!(animation.frame(), FrameStatus::Cancelled);
        assert_eq!(frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_animated_value_restarts_on_new_target() {
        let clock = Arc::new(ManualClock::new());
        let mut value = AnimatedValue::new(Duration::from_millis(1000), Rounding::Floor, clock.clone());

        value.set_target(200.0);
        clock.advance(Duration::from_millis(500));
        value.frame();
        assert_eq!(value.display(), 187.0);

        value.set_target(80.0);
        assert_eq!(value.display(), 0.0);
        assert!(value.is_animating());

        clock.advance(Duration::from_millis(999));
        value.frame();
        assert!(value.display() <= 80.0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(value.frame(), FrameStatus::Finished);
        assert_eq!(value.display(), 80.0);
    }

    #[test]
    fn test_animated_value_same_target_keeps_running() {
        let clock = Arc::new(ManualClock::new());
        let mut value = AnimatedValue::new(Duration::from_millis(1000), Rounding::Decimals(1), clock.clone());
        value.set_target(62.5);
        clock.advance(Duration::from_millis(1000));
        value.set_target(62.5);
        assert_eq!(value.frame(), FrameStatus::Finished);
        assert_eq!(value.display(), 62.5);
    }
}
