//! Monotonic time source
//!
//! Timeouts are tracked in whole milliseconds. The counter only has to be
//! monotonic; its origin is arbitrary.

/// Monotonic millisecond clock
pub trait Clock {
    /// Current time in milliseconds since an arbitrary origin
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `since` (a value previously returned by [`Clock::now_ms`])
    fn elapsed_ms(&self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        C::now_ms(self)
    }
}

/// Host clock backed by [`std::time::Instant`]
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
