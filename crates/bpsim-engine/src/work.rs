use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bpsim_core::config::SimulationConfig;
use bpsim_core::traits::{WorkKind, WorkSimulator};

/// Delay source backed by a seeded generator owned by this value.
///
/// Fixed work always takes `fixed`; variable work takes a uniformly drawn
/// number of milliseconds in `[min, max]`.
pub struct SimulatedWork {
    fixed: Duration,
    min: Duration,
    max: Duration,
    seed: Option<u64>,
    rng: Mutex<StdRng>,
}

impl SimulatedWork {
    pub fn new(fixed: Duration, min: Duration, max: Duration, seed: Option<u64>) -> Self {
        // An inverted range collapses to its lower bound.
        let max = max.max(min);
        Self {
            fixed,
            min,
            max,
            seed,
            rng: Mutex::new(fresh_rng(seed)),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        let (min, max) = config.active_range();
        Self::new(config.activity_delay(), min, max, config.seed)
    }

    /// No delays at all.
    pub fn instant() -> Self {
        Self::from_config(&SimulationConfig::instant())
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

fn fresh_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl WorkSimulator for SimulatedWork {
    fn duration(&self, kind: WorkKind, _description: &str) -> Duration {
        match kind {
            WorkKind::Fixed => self.fixed,
            WorkKind::Variable => {
                if self.min == self.max {
                    return self.min;
                }
                let min_ms = self.min.as_millis() as u64;
                let max_ms = self.max.as_millis() as u64;
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                Duration::from_millis(rng.gen_range(min_ms..=max_ms))
            }
        }
    }

    fn reseed(&self) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        *rng = fresh_rng(self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws(work: &SimulatedWork, n: usize) -> Vec<Duration> {
        (0..n)
            .map(|_| work.duration(WorkKind::Variable, "a"))
            .collect()
    }

    #[test]
    fn test_fixed_work_uses_configured_delay() {
        let work = SimulatedWork::from_config(&SimulationConfig::default());
        assert_eq!(work.duration(WorkKind::Fixed, "a"), Duration::from_secs(1));
    }

    #[test]
    fn test_variable_work_stays_in_range() {
        let work = SimulatedWork::new(
            Duration::ZERO,
            Duration::from_millis(1000),
            Duration::from_millis(3000),
            None,
        );
        for d in draws(&work, 200) {
            assert!(d >= Duration::from_millis(1000) && d <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let config = SimulationConfig {
            seed: Some(99),
            ..SimulationConfig::default()
        };
        let a = SimulatedWork::from_config(&config);
        let b = SimulatedWork::from_config(&config);
        assert_eq!(draws(&a, 20), draws(&b, 20));
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let config = SimulationConfig {
            seed: Some(3),
            ..SimulationConfig::default()
        };
        let work = SimulatedWork::from_config(&config);
        let first = draws(&work, 10);
        work.reseed();
        assert_eq!(draws(&work, 10), first);
    }

    #[test]
    fn test_instant_has_no_delays() {
        let work = SimulatedWork::instant();
        assert_eq!(work.duration(WorkKind::Fixed, "a"), Duration::ZERO);
        assert_eq!(work.duration(WorkKind::Variable, "a"), Duration::ZERO);
        assert!(work.seed().is_none());
    }
}
