use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};
use std::time::Duration;
use surge_core::{ConfigError, JITTER_LAMBDA, NANOS_PER_SEC};

/// Poisson-jittered inter-arrival times around a target mean.
///
/// Every sample is `k * mean / λ` where `k ~ Poisson(λ)`, so the long-run mean stays at `mean`
/// while individual gaps fluctuate by roughly `1/sqrt(λ)`.
pub(crate) struct Jitter {
    dist: Poisson<f64>,
    rng: SmallRng,
    mean_nanos: f64,
}

impl Jitter {
    pub fn new(mean: Duration, seed: Option<u64>) -> Result<Self, ConfigError> {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Ok(Self {
            dist: Poisson::new(JITTER_LAMBDA)?,
            rng,
            mean_nanos: mean.as_nanos() as f64,
        })
    }

    /// Mean gap between requests for the given rate in requests per second.
    ///
    /// Rates that would need a gap below one nanosecond are rejected rather than paced at zero.
    pub fn mean_for(throughput: f64) -> Result<Duration, ConfigError> {
        if !throughput.is_finite() || throughput <= 0. {
            return Err(ConfigError::ZeroThroughput);
        }

        let nanos = (NANOS_PER_SEC / throughput) as u64;
        if nanos == 0 {
            return Err(ConfigError::ExcessiveThroughput(throughput as u32));
        }
        Ok(Duration::from_nanos(nanos))
    }

    pub fn next_interval(&mut self) -> Duration {
        let sample: f64 = self.dist.sample(&mut self.rng);
        Duration::from_nanos((sample * self.mean_nanos / JITTER_LAMBDA) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_for_rate() {
        assert_eq!(Jitter::mean_for(10.).unwrap(), Duration::from_millis(100));
        assert_eq!(Jitter::mean_for(2.5).unwrap(), Duration::from_millis(400));
        assert!(matches!(
            Jitter::mean_for(0.),
            Err(ConfigError::ZeroThroughput)
        ));
        assert!(Jitter::mean_for(f64::NAN).is_err());
    }

    #[test]
    fn mean_never_rounds_to_zero() {
        assert_eq!(Jitter::mean_for(1e9).unwrap(), Duration::from_nanos(1));
        assert!(matches!(
            Jitter::mean_for(2e9),
            Err(ConfigError::ExcessiveThroughput(2_000_000_000))
        ));
    }

    #[test]
    fn sample_mean_converges_to_target() {
        let mean = Jitter::mean_for(1_000.).unwrap();
        let mut jitter = Jitter::new(mean, Some(11)).unwrap();

        let n = 20_000;
        let total: u128 = (0..n).map(|_| jitter.next_interval().as_nanos()).sum();
        let sample_mean = total as f64 / n as f64;

        let target = 1e9 / 1_000.;
        assert!(
            (sample_mean - target).abs() / target < 0.01,
            "sample mean {sample_mean} too far from {target}"
        );
    }

    #[test]
    fn intervals_fluctuate() {
        let mut jitter = Jitter::new(Duration::from_millis(100), Some(3)).unwrap();
        let samples: Vec<_> = (0..50).map(|_| jitter.next_interval()).collect();

        assert!(samples.windows(2).any(|w| w[0] != w[1]));
        assert!(samples
            .iter()
            .all(|s| *s > Duration::from_millis(40) && *s < Duration::from_millis(160)));
    }

    #[test]
    fn seeded_streams_repeat() {
        let mut a = Jitter::new(Duration::from_millis(10), Some(42)).unwrap();
        let mut b = Jitter::new(Duration::from_millis(10), Some(42)).unwrap();
        for _ in 0..10 {
            assert_eq!(a.next_interval(), b.next_interval());
        }
    }
}
