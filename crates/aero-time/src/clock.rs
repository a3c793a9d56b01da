#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    now_ns: u64,
}

impl Clock {
    pub const fn new() -> Self {
        Self { now_ns: 0 }
    }

    /// Returns the current monotonic virtual time, in nanoseconds.
    #[inline]
    pub const fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Moves the clock forward to `now_ns`.
    ///
    /// # Panics
    ///
    /// Panics if `now_ns` is in the past.
    #[inline]
    pub fn advance_to(&mut self, now_ns: u64) {
        assert!(
            now_ns >= self.now_ns,
            "virtual clock moved backwards: now={} target={now_ns}",
            self.now_ns
        );
        self.now_ns = now_ns;
    }
}
