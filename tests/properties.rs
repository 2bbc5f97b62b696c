use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rollfit::{
    algebra, assert_bracketed, assert_close, assert_matrix_close,
    basis,
    critical::{IntervalKind, StudentT},
    nalgebra::{DMatrix, DVector},
    Error, Observation, RegressionFit, RollingPredictor,
};

fn noisy_series(n: usize, sigma: f64, seed: u64) -> (Vec<Observation>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();
    (1..=n)
        .map(|day| {
            let x1 = day as f64;
            let x2 = 21.0 + 4.0 * (x1 * 0.37).sin() + rng.gen_range(-1.0..1.0);
            let y = 2400.0 + 85.0 * x1 - 1.9 * x1 * x1 + 12.0 * x2 + 0.4 * x1 * x2;
            (Observation::new(x1, x2), y + noise.sample(&mut rng))
        })
        .unzip()
}

#[test]
fn inverse_times_matrix_is_identity() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
        // AᵀA + I is symmetric positive definite, hence invertible
        let a = DMatrix::from_fn(7, 5, |_, _| rng.gen_range(-3.0..3.0));
        let m = a.transpose() * &a + DMatrix::<f64>::identity(5, 5);

        let inv = algebra::invert(&m).unwrap();
        let product = algebra::multiply(&m, &inv).unwrap();
        assert_matrix_close!(product, DMatrix::<f64>::identity(5, 5), 1e-9);
    }
}

#[test]
fn rank_deficient_moments_are_rejected() {
    // x2 = 2·x1 makes the x2 and x1·x2 columns multiples of x1 and x1²
    let observations: Vec<Observation> =
        (1..=10).map(|day| Observation::new(day as f64, 2.0 * day as f64)).collect();
    let design = basis::augment(&observations);
    let moments = algebra::multiply(&algebra::transpose(&design), &design).unwrap();

    assert!(matches!(algebra::invert(&moments), Err(Error::SingularMatrix { size: 5, .. })));

    let targets = vec![1.0; 10];
    assert!(matches!(
        RegressionFit::new(&observations, &targets),
        Err(Error::SingularMatrix { .. })
    ));
}

#[test]
fn coefficients_agree_with_svd_least_squares() {
    let (observations, targets) = noisy_series(30, 20.0, 3);
    let fit = RegressionFit::new(&observations, &targets).unwrap();

    let design = basis::augment(&observations);
    let y = DVector::from_column_slice(&targets);
    let reference = design.svd(true, true).solve(&y, 1e-12).unwrap();

    for (&b, &r) in fit.coefficients().iter().zip(reference.iter()) {
        assert_close!(b, r, 1e-4 * (1.0 + r.abs()));
    }
}

#[test]
fn band_width_scales_with_critical_value() {
    let (observations, targets) = noisy_series(20, 10.0, 9);
    let step = RegressionFit::new(&observations, &targets).unwrap();
    let student = RegressionFit::with_critical(&observations, &targets, &StudentT).unwrap();

    assert_eq!(step.critical_value(), 2.23);
    assert_eq!(student.critical_value(), 2.131);
    for (a, b) in step.bands().iter().zip(student.bands()) {
        assert_close!(a.value(), b.value(), 1e-9);
        assert_close!(b.width() / a.width(), 2.131 / 2.23, 1e-9);
    }
}

#[test]
fn forecast_band_is_symmetric_and_grows_away_from_the_data() {
    let (observations, targets) = noisy_series(20, 10.0, 13);
    let fit = RegressionFit::new(&observations, &targets).unwrap();

    let mut previous = 0.0;
    for ahead in [1.0, 5.0, 20.0] {
        let next = Observation::new(20.0 + ahead, 21.0);
        let band = fit.forecast(&next, IntervalKind::Confidence).unwrap();
        assert_bracketed!(band);
        assert_close!(band.value() - band.min(), band.max() - band.value(), 1e-6);
        assert!(band.width() > previous);
        previous = band.width();
    }
}

#[test]
fn small_window_over_a_long_series() {
    let (observations, targets) = noisy_series(60, 5.0, 17);
    let (history, future) = observations.split_at(30);
    let (history_targets, future_targets) = targets.split_at(30);

    let mut predictor = RollingPredictor::builder()
        .window_size(10)
        .critical(StudentT)
        .build(history, history_targets)
        .unwrap();
    assert_eq!(predictor.window().len(), 10);
    assert_eq!(predictor.window().next().unwrap().0.x1, 21.0);

    let records = predictor.run(future, future_targets).unwrap();
    assert_eq!(records.len(), 30);
    assert_eq!(records[0].step(), 31);
    assert_eq!(records[29].step(), 60);
    assert_eq!(predictor.window().len(), 10);
    assert_eq!(predictor.position(), 60);

    for record in &records {
        assert_bracketed!(record.band());
        assert!(record.band().width() > 0.0);
    }
}

#[test]
fn invalid_configurations() {
    let (observations, targets) = noisy_series(20, 5.0, 19);

    assert_eq!(
        RollingPredictor::builder()
            .window_size(5)
            .build(&observations, &targets)
            .unwrap_err(),
        Error::InvalidWindow { window: 5, minimum: 6 }
    );
    assert_eq!(
        RollingPredictor::builder()
            .window_size(21)
            .build(&observations, &targets)
            .unwrap_err(),
        Error::WindowUnderfilled { window: 21, available: 20 }
    );

    let mut predictor = RollingPredictor::new(&observations, &targets).unwrap();
    let before: Vec<_> = predictor.window().collect();
    assert_eq!(
        predictor.step((21.0, f64::NAN), 4000.0).unwrap_err(),
        Error::NonFinite("forecast observation")
    );
    assert_eq!(
        predictor.step((21.0, 21.0), f64::INFINITY).unwrap_err(),
        Error::NonFinite("actual")
    );
    assert_eq!(predictor.window().collect::<Vec<_>>(), before);
    assert_eq!(predictor.position(), 20);
}
