//! Utility functions for randomly generating movies

use ndarray::{Array, Array1, Array2, Array3, Axis};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Normal, Uniform},
    RandomExt,
};

/// Movie together with the sources it was built from
#[derive(Debug, Clone)]
pub struct SyntheticMovie {
    /// `(time, height, width)` frames
    pub movie: Array3<f64>,
    /// `(n_sources, height, width)` spatial patterns
    pub patterns: Array3<f64>,
    /// `(n_sources, time)` time courses driving the patterns
    pub timecourses: Array2<f64>,
}

/// Builder of synthetic movies
#[derive(Debug, Clone, PartialEq)]
pub struct MovieBuilder {
    height: usize,
    width: usize,
    time: usize,
    n_sources: usize,
    fps: f64,
    baseline: f64,
    drift: f64,
    noise_std: f64,
}

impl MovieBuilder {
    pub fn new(height: usize, width: usize, time: usize) -> Self {
        MovieBuilder {
            height,
            width,
            time,
            n_sources: 3,
            fps: 10.,
            baseline: 100.,
            drift: 0.01,
            noise_std: 0.1,
        }
    }

    /// Number of independent sources
    pub fn sources(mut self, n_sources: usize) -> Self {
        self.n_sources = n_sources;
        self
    }

    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Offset and linear drift per frame of the global baseline
    pub fn baseline(mut self, baseline: f64, drift: f64) -> Self {
        self.baseline = baseline;
        self.drift = drift;
        self
    }

    /// Standard deviation of the white noise added to every pixel
    pub fn noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    pub fn build(&self, rng: &mut impl Rng) -> SyntheticMovie {
        let patterns = self.patterns(rng);
        let timecourses = self.timecourses(rng);

        let n_pixels = self.height * self.width;
        let flat = patterns
            .view()
            .into_shape((self.n_sources, n_pixels))
            .map(|p| p.to_owned())
            .unwrap_or_else(|_| Array2::zeros((self.n_sources, n_pixels)));
        let mut frames = timecourses.t().dot(&flat);

        let baseline = Array1::from_shape_fn(self.time, |t| self.baseline + self.drift * t as f64);
        frames += &baseline.insert_axis(Axis(1));
        if self.noise_std > 0. {
            if let Ok(normal) = Normal::new(0., self.noise_std) {
                frames += &Array::random_using((self.time, n_pixels), normal, rng);
            }
        }

        let movie = frames
            .into_shape((self.time, self.height, self.width))
            .unwrap_or_else(|_| Array3::zeros((self.time, self.height, self.width)));

        SyntheticMovie {
            movie,
            patterns,
            timecourses,
        }
    }

    /// Gaussian blobs at random positions
    fn patterns(&self, rng: &mut impl Rng) -> Array3<f64> {
        let sigma = (self.height.min(self.width) as f64 / 6.).max(1.);
        let mut patterns = Array3::zeros((self.n_sources, self.height, self.width));

        for mut pattern in patterns.outer_iter_mut() {
            let cy = rng.gen_range(0.0..self.height.max(1) as f64);
            let cx = rng.gen_range(0.0..self.width.max(1) as f64);
            pattern.indexed_iter_mut().for_each(|((y, x), v)| {
                let d2 = (y as f64 - cy).powi(2) + (x as f64 - cx).powi(2);
                *v = (-d2 / (2. * sigma * sigma)).exp();
            });
        }

        patterns
    }

    /// Sine, square and sawtooth waves of random frequency and phase, in turn
    fn timecourses(&self, rng: &mut impl Rng) -> Array2<f64> {
        let nyquist = self.fps / 2.;
        let freqs = Array::random_using(self.n_sources, Uniform::new(0.02, 0.2), rng);
        let phases = Array::random_using(
            self.n_sources,
            Uniform::new(0., 2. * std::f64::consts::PI),
            rng,
        );

        Array2::from_shape_fn((self.n_sources, self.time), |(i, t)| {
            let cycles = (freqs[i] * nyquist) * t as f64 / self.fps;
            let angle = 2. * std::f64::consts::PI * cycles + phases[i];
            match i % 3 {
                0 => angle.sin(),
                1 => angle.sin().signum(),
                _ => 2. * (angle / (2. * std::f64::consts::PI)).fract() - 1.,
            }
        })
    }
}

/// Disk covering the middle of a `(height, width)` frame
pub fn circular_mask(height: usize, width: usize) -> Array2<bool> {
    let (cy, cx) = ((height as f64 - 1.) / 2., (width as f64 - 1.) / 2.);
    let radius = height.min(width) as f64 / 2.;

    Array2::from_shape_fn((height, width), |(y, x)| {
        (y as f64 - cy).powi(2) + (x as f64 - cx).powi(2) <= radius * radius
    })
}
