use foundation::angles::normalize360;

/// Raw device-orientation reading, degrees.
///
/// `alpha` is the compass-like rotation in `[0, 360)` relative to a
/// device-dependent zero; `beta` and `gamma` are front/back and left/right
/// tilt.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrientationSample {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl OrientationSample {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    /// Sensor events may carry nulls before the hardware settles.
    pub fn from_event(alpha: Option<f64>, beta: Option<f64>, gamma: Option<f64>) -> Option<Self> {
        match (alpha, beta, gamma) {
            (Some(a), Some(b), Some(g)) if a.is_finite() && b.is_finite() && g.is_finite() => {
                Some(Self::new(a, b, g))
            }
            _ => None,
        }
    }
}

/// Turns raw samples into a calibrated heading.
///
/// Only the latest sample is kept. Calibration makes the device's current
/// facing read as heading 0; the heading is `normalize360(alpha - offset)`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OrientationCalibrator {
    offset: f64,
    last: Option<OrientationSample>,
}

impl OrientationCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn last_sample(&self) -> Option<OrientationSample> {
        self.last
    }

    pub fn ingest(&mut self, sample: OrientationSample) -> f64 {
        self.last = Some(sample);
        self.heading_of(sample)
    }

    /// Calibrated heading of the latest sample, if any arrived.
    pub fn heading(&self) -> Option<f64> {
        self.last.map(|s| self.heading_of(s))
    }

    /// Adopts the latest sample's alpha as the new zero. Without a sample the
    /// offset is left untouched.
    pub fn calibrate(&mut self) -> f64 {
        if let Some(sample) = self.last {
            self.offset = sample.alpha;
        }
        self.offset
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn heading_of(&self, sample: OrientationSample) -> f64 {
        normalize360(sample.alpha - self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::{OrientationCalibrator, OrientationSample};

    #[test]
    fn applies_offset_and_wraps() {
        let mut c = OrientationCalibrator::new();
        c.ingest(OrientationSample::new(10.0, 0.0, 0.0));
        assert_eq!(c.calibrate(), 10.0);
        assert_eq!(c.ingest(OrientationSample::new(350.0, 0.0, 0.0)), 340.0);
        assert_eq!(c.ingest(OrientationSample::new(5.0, 0.0, 0.0)), 355.0);
    }

    #[test]
    fn calibrating_twice_without_new_sample_is_idempotent() {
        let mut c = OrientationCalibrator::new();
        c.ingest(OrientationSample::new(123.4, 10.0, -3.0));
        let first = c.calibrate();
        let second = c.calibrate();
        assert_eq!(first, second);
        assert_eq!(c.heading(), Some(0.0));
    }

    #[test]
    fn calibrate_without_sample_keeps_zero_offset() {
        let mut c = OrientationCalibrator::new();
        assert_eq!(c.calibrate(), 0.0);
        assert_eq!(c.heading(), None);
    }

    #[test]
    fn only_latest_sample_is_retained() {
        let mut c = OrientationCalibrator::new();
        for alpha in [1.0, 2.0, 3.0] {
            c.ingest(OrientationSample::new(alpha, 0.0, 0.0));
        }
        assert_eq!(c.last_sample().map(|s| s.alpha), Some(3.0));
    }

    #[test]
    fn null_readings_are_dropped() {
        assert!(OrientationSample::from_event(None, Some(1.0), Some(2.0)).is_none());
        assert!(OrientationSample::from_event(Some(f64::NAN), Some(1.0), Some(2.0)).is_none());
        assert_eq!(
            OrientationSample::from_event(Some(1.0), Some(2.0), Some(3.0)),
            Some(OrientationSample::new(1.0, 2.0, 3.0))
        );
    }
}
