//! Clock and delay abstraction.
//!
//! The only place the publisher waits is the bounded poll for response bytes.
//! Injecting the clock keeps that loop deterministic under test and lets
//! firmware plug in a SysTick counter or an RTOS tick.

/// Monotonic millisecond clock with a blocking delay.
pub trait Timer {
    /// Milliseconds since an arbitrary fixed point. Must never go backwards.
    fn now_ms(&mut self) -> u64;
    /// Block the caller for roughly `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Async twin of [`Timer`] for executors such as Embassy.
#[cfg(feature = "async")]
#[allow(async_fn_in_trait)]
pub trait AsyncTimer {
    fn now_ms(&mut self) -> u64;
    async fn delay_ms(&mut self, ms: u32);
}

/// [`Timer`] backed by `std::time::Instant` and `std::thread::sleep`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdTimer {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimer {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Timer for StdTimer {
    fn now_ms(&mut self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}
