use foundation::time::Time;

/// Deterministic frame metadata.
///
/// This is the timebase every update tick runs on. Hosts either step it with
/// [`Frame::next`] or build it from their own clock with [`Frame::at`]; both
/// keep runs replayable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time since the previous frame (seconds).
    pub dt_s: f64,
    /// Engine time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// A frame stamped with an externally supplied time.
    pub fn at(index: u64, time: Time, dt_s: f64) -> Self {
        Self { index, dt_s, time }
    }

    pub fn next(self) -> Self {
        Self {
            index: self.index + 1,
            dt_s: self.dt_s,
            time: self.time.after(self.dt_s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn frame_time_is_deterministic() {
        let a = Frame::new(10, 0.25);
        let b = Frame::new(10, 0.25);
        assert_eq!(a, b);
        assert_eq!(a.time, Time(2.5));
    }

    #[test]
    fn next_advances_index_and_time() {
        let f0 = Frame::at(0, Time(3.0), 0.5);
        let f1 = f0.next();
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(3.5));
    }
}
