//! `seas-datasets` provides synthetic imaging movies ready to be used in tests, benches and
//! examples.
//!
//! A movie is a `(time, height, width)` array built from a few spatial patterns, each driven by
//! its own time course, on top of a drifting baseline and white noise. The ground truth patterns
//! and time courses are returned alongside the movie so that a decomposition can be checked
//! against them.
//!
//! ```ignore
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let synthetic = seas_datasets::generate::MovieBuilder::new(32, 32, 200)
//!     .sources(4)
//!     .build(&mut rng);
//! ```

pub mod generate;
