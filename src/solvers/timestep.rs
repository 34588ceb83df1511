use crate::error::{Error, Result};

/// Limits on how the timestep may change from one step to the next.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimestepLimits {
    pub dtrise: f64,
    pub dtmax: f64,
    pub dtmin: f64,
}

impl TimestepLimits {
    /// Choose the timestep for a step, given the smallest stable timestep
    /// over the mesh and the previous step's timestep. The result never
    /// exceeds `dtmax` or grows by more than a factor of `dtrise`; falling
    /// below `dtmin` is fatal.
    pub fn select(&self, candidate: f64, dtold: f64, step: u64) -> Result<f64> {
        let dt = candidate.min(dtold * self.dtrise).min(self.dtmax);

        if dt < self.dtmin {
            return Err(Error::SmallTimestep {
                step,
                dt,
                dtmin: self.dtmin,
            });
        }
        Ok(dt)
    }
}

#[cfg(test)]
mod test {

    use super::TimestepLimits;
    use crate::error::Error;

    const LIMITS: TimestepLimits = TimestepLimits {
        dtrise: 1.5,
        dtmax: 0.04,
        dtmin: 1e-7,
    };

    #[test]
    fn stable_candidate_is_clamped_by_max_and_rise() {
        assert_eq!(LIMITS.select(0.5, 0.04, 1).unwrap(), 0.04);
        assert!((LIMITS.select(0.5, 0.01, 1).unwrap() - 0.015).abs() < 1e-15);
        assert_eq!(LIMITS.select(0.002, 0.04, 1).unwrap(), 0.002);
    }

    #[test]
    fn selected_timestep_never_exceeds_either_bound() {
        let mut dtold = 1e-3;
        for n in 0..50 {
            let candidate = 0.01 * (1.0 + (n as f64).sin().abs());
            let dt = LIMITS.select(candidate, dtold, n).unwrap();
            assert!(dt <= LIMITS.dtmax);
            assert!(dt <= dtold * LIMITS.dtrise);
            dtold = dt;
        }
    }

    #[test]
    fn tiny_timestep_is_fatal() {
        let result = LIMITS.select(1e-9, 0.04, 12);
        assert!(matches!(result, Err(Error::SmallTimestep { step: 12, .. })));
        assert!(LIMITS.select(1e-7, 0.04, 12).is_ok());
    }
}
