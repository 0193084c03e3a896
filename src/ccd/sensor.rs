use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

/// Above this mean the Poisson draw is replaced by its Gaussian limit.
const POISSON_GAUSSIAN_LIMIT: f64 = 1e6;

/// Fill a frame with shot-noise electrons.
///
/// Sky photons and dark current are both counting processes collected in
/// the same well, so every pixel gets a single Poisson draw with mean
/// `mean_electrons`.
pub fn shot_noise_frame(shape: (usize, usize), mean_electrons: f64, rng: &mut impl Rng) -> Array2<f64> {
    if mean_electrons <= 0.0 {
        return Array2::zeros(shape);
    }
    if mean_electrons < POISSON_GAUSSIAN_LIMIT {
        if let Ok(dist) = Poisson::new(mean_electrons) {
            return Array2::from_shape_simple_fn(shape, || dist.sample(&mut *rng));
        }
    }
    let sigma = mean_electrons.sqrt();
    match Normal::new(mean_electrons, sigma) {
        Ok(dist) => Array2::from_shape_simple_fn(shape, || dist.sample(&mut *rng).max(0.0).round()),
        Err(_) => Array2::from_elem(shape, mean_electrons.round()),
    }
}

/// Add zero-mean Gaussian read noise (electrons).
///
/// Negative excursions are kept; the floor is applied after digitization.
pub fn add_read_noise(grid: &mut Array2<f64>, sigma: f64, rng: &mut impl Rng) {
    if sigma <= 0.0 {
        return;
    }
    let Ok(dist) = Normal::new(0.0, sigma) else {
        log::warn!("read noise sigma {sigma} rejected by the sampler, skipping");
        return;
    };
    grid.mapv_inplace(|e| e + dist.sample(&mut *rng));
}
