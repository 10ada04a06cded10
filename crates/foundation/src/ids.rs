/// Monotonic generation counter.
///
/// A value handed out with an asynchronous request; results that come back
/// carrying an older generation belong to a torn-down owner and are dropped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(n: u64) -> Self {
        Generation(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}
