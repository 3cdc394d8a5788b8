use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Normal, Distribution};

/// Samplers used to seed independent candidate trajectories.  Every sampler takes an explicit
/// seed so that multi-start runs are reproducible.
pub struct SimpleSamplers;
impl SimpleSamplers {
    pub fn uniform_samples(bounds: &Vec<(f64, f64)>, seed: u64) -> Vec<f64> {
        let mut out_vec = vec![];
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for b in bounds {
            if b.0 == b.1 {
                out_vec.push(b.0);
            } else {
                out_vec.push(rng.gen_range(b.0..b.1));
            }
        }
        out_vec
    }
    /// Zero standard deviations return the mean unchanged.
    pub fn normal_samples(means_and_standard_deviations: &Vec<(f64, f64)>, seed: u64) -> Vec<f64> {
        let mut out_vec = vec![];
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for (mean, standard_deviation) in means_and_standard_deviations {
            if *standard_deviation <= 0.0 {
                out_vec.push(*mean);
                continue;
            }
            match Normal::new(*mean, *standard_deviation) {
                Ok(distribution) => { out_vec.push(distribution.sample(&mut rng)); }
                Err(_) => { out_vec.push(*mean); }
            }
        }
        out_vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_samples() {
        let bounds = vec![(0.0, 1.0), (-2.0, 2.0), (3.0, 3.0)];
        let a = SimpleSamplers::uniform_samples(&bounds, 7);
        let b = SimpleSamplers::uniform_samples(&bounds, 7);
        assert_eq!(a, b);
        assert_eq!(a[2], 3.0);
        assert!(a[0] >= 0.0 && a[0] < 1.0);
    }

    #[test]
    fn zero_deviation_returns_mean() {
        let s = SimpleSamplers::normal_samples(&vec![(1.5, 0.0), (0.0, 1.0)], 3);
        assert_eq!(s[0], 1.5);
        assert!(s[1].is_finite());
    }
}
