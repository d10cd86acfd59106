use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic session clock. All timestamps are nanoseconds from the most
/// recent `restart`, so every trial's fields are directly comparable
/// within and across trials.
pub trait Clock {
    /// Re-anchor time zero at the current instant.
    fn restart(&self);

    /// Nanoseconds elapsed since the anchor.
    fn now_ns(&self) -> u64;

    /// Suspend the caller for `d`. The sequencer's only way of waiting.
    fn sleep(&self, d: Duration);
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn restart(&self) {
        (**self).restart();
    }
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn restart(&self) {
        (**self).restart();
    }
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

/// Wall clock backed by `Instant`, with platform high-precision sleep.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor: Cell<Instant>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Cell::new(Instant::now()),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn restart(&self) {
        self.anchor.set(Instant::now());
    }

    fn now_ns(&self) -> u64 {
        self.anchor.get().elapsed().as_nanos() as u64
    }

    fn sleep(&self, d: Duration) {
        high_precision_sleep(d);
    }
}

/// Deterministic clock for tests: `sleep` advances virtual time exactly,
/// nothing else moves it. Share one via `Rc` between the sequencer and a
/// fake capture backend to get exact capture-window arithmetic.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + d.as_nanos() as u64);
    }
}

impl Clock for ManualClock {
    fn restart(&self) {
        self.now.set(0);
    }

    fn now_ns(&self) -> u64 {
        self.now.get()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Platform-specific sleep with sub-millisecond precision where the OS
/// offers it.
pub fn high_precision_sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    #[cfg(target_os = "linux")]
    linux_sleep(duration);
    #[cfg(target_os = "macos")]
    macos_sleep(duration);
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fallback_sleep(duration);
}

#[cfg(target_os = "linux")]
fn linux_sleep(duration: Duration) {
    use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

    let req = timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };

    unsafe {
        clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
    }
}

#[cfg(target_os = "macos")]
fn macos_sleep(duration: Duration) {
    use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

    // Spin for very short waits; the scheduler is too coarse for them.
    if duration.as_nanos() < 100_000 {
        unsafe {
            let start = mach_absolute_time();
            let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
            mach_timebase_info(&mut timebase);

            let target_ticks =
                duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

            while mach_absolute_time() - start < target_ticks {
                std::hint::spin_loop();
            }
        }
    } else {
        std::thread::sleep(duration);
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn fallback_sleep(duration: Duration) {
    // Coarse sleep up to the last millisecond, then spin to the deadline.
    let start = Instant::now();
    if let Some(coarse) = duration.checked_sub(Duration::from_millis(1)) {
        std::thread::sleep(coarse);
    }
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }

    #[test]
    fn restart_re_anchors_time_zero() {
        let clock = MonotonicClock::new();
        clock.sleep(Duration::from_millis(5));
        clock.restart();
        assert!(clock.now_ns() < 1_000_000_000);
    }

    #[test]
    fn sleep_waits_at_least_the_requested_duration() {
        let clock = MonotonicClock::new();
        clock.restart();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now_ns() >= 5_000_000);
    }

    #[test]
    fn manual_clock_advances_only_on_sleep() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_ns(), 0);
        clock.sleep(Duration::from_millis(1500));
        assert_eq!(clock.now_ns(), 1_500_000_000);
        clock.restart();
        assert_eq!(clock.now_ns(), 0);
    }

    #[test]
    fn manual_clock_is_shareable_through_rc() {
        let clock = Rc::new(ManualClock::new());
        let handle: &dyn Clock = &clock;
        handle.sleep(Duration::from_secs(1));
        assert_eq!(clock.now_ns(), 1_000_000_000);
    }
}
