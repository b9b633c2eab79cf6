/// Engine time in seconds since initialize.
///
/// This is the monotonic timebase light animation runs on; it accumulates
/// frame deltas rather than reading a wall clock, so replays are exact.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Time(pub f64);

impl Time {
    pub fn zero() -> Self {
        Time(0.0)
    }

    pub fn advanced_by(self, dt_s: f64) -> Self {
        Time(self.0 + dt_s.max(0.0))
    }
}
