use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use seas::traits::IcaSolver;
use seas::ParamGuard;
use seas_datasets::generate::MovieBuilder;
use seas_ica::{FastIcaParams, GFunc};

/// Signal matrix `(pixels, time)` of a synthetic movie with `side * side` pixels
fn create_data(side: usize) -> Array2<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let synthetic = MovieBuilder::new(side, side, 200)
        .sources(4)
        .noise(0.2)
        .build(&mut rng);

    let (matrix, _) = seas::movie::flatten_movie(synthetic.movie.view()).unwrap();
    let mean = matrix.mean_axis(ndarray::Axis(0)).unwrap();
    matrix - &mean
}

fn perform_ica(matrix: &Array2<f64>, gfunc: GFunc) {
    let ica = FastIcaParams::new().gfunc(gfunc).random_seed().check_unwrap();
    let _factors = ica.solve(matrix.view(), 8, None, 200);
}

fn gfunc_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fast ICA");
    for side in [16, 32, 64].iter() {
        let matrix = create_data(*side);
        for (name, gfunc) in [
            ("GFunc_LogCosH", GFunc::Logcosh(1.0)),
            ("GFunc_Cube", GFunc::Cube),
            ("GFunc_Exp", GFunc::Exp),
        ] {
            group.bench_with_input(BenchmarkId::new(name, side * side), &matrix, |b, matrix| {
                b.iter(|| perform_ica(matrix, gfunc));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, gfunc_bench);
criterion_main!(benches);
