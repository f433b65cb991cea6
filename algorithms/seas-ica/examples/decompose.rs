use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use seas::prelude::*;
use seas_datasets::generate::{circular_mask, MovieBuilder};
use seas_ica::{svd::ThinSvd, FastIcaParams};
use seas_signal::{NoiseSorter, SignalFilter};

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let synthetic = MovieBuilder::new(32, 32, 300)
        .sources(5)
        .fps(10.)
        .noise(0.5)
        .build(&mut rng);
    let mask = SpatialMask::new(circular_mask(32, 32));

    let (matrix, shape) = flatten_movie(synthetic.movie.view())?;
    let ica = FastIcaParams::new().check()?;
    let toolkit = Toolkit::new(ThinSvd, ica, NoiseSorter::new());

    let mut decomposition =
        DecomposeParams::new().decompose(matrix.view(), shape, Some(&mask), &toolkit)?;
    println!(
        "{} components, {} classified as noise (lag-1 cutoff {:.3})",
        decomposition.n_components(),
        decomposition.noise_components().iter().filter(|&&n| n).count(),
        decomposition.cutoff()
    );

    // mark the first component as an artifact and remove it
    let mut artifacts = ndarray::Array1::from_elem(decomposition.n_components(), false);
    artifacts[0] = true;
    decomposition.set_artifact_components(artifacts)?;

    let filter = SignalFilter::new();
    let comparison = RebuildParams::new()
        .fps(10.)
        .include_noise(false)
        .check()?
        .filter_comparison(&decomposition, TimeWindow::full(), &filter)?;

    let energy = |movie: &ndarray::Array3<f64>| movie.mapv(|v| v * v).mean().unwrap_or(0.);
    println!(
        "mean squared intensity: raw {:.2}, artifact {:.2}, filtered {:.2}",
        energy(&comparison.raw),
        energy(&comparison.artifact),
        energy(&comparison.filtered)
    );

    Ok(())
}
