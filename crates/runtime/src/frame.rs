use foundation::time::Time;

/// Per-frame timebase.
///
/// The host drives the loop and supplies a wall delta each update; engine
/// time accumulates those deltas so it stays monotonic regardless of how
/// irregular the host's cadence is.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta supplied by the host for this frame (seconds).
    pub dt_s: f64,
    /// Engine time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn start() -> Self {
        Self {
            index: 0,
            dt_s: 0.0,
            time: Time::zero(),
        }
    }

    pub fn advanced(self, dt_s: f64) -> Self {
        Self {
            index: self.index + 1,
            dt_s,
            time: self.time.advanced_by(self.dt_s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn time_accumulates_previous_deltas() {
        let f0 = Frame::start();
        let f1 = f0.advanced(0.5);
        let f2 = f1.advanced(0.25);
        assert_eq!(f1.time, Time(0.0));
        assert_eq!(f2.time, Time(0.5));
        assert_eq!(f2.index, 2);
    }

    #[test]
    fn irregular_deltas_stay_monotonic() {
        let mut f = Frame::start();
        let mut last = f.time.0;
        for dt in [0.016, 0.2, 0.0, 0.016] {
            f = f.advanced(dt);
            assert!(f.time.0 >= last);
            last = f.time.0;
        }
    }
}
