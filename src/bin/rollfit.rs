use std::path::Path;

use rollfit::{
    critical::{CriticalValue, IntervalKind, StepApproximation, StudentT},
    display::Report,
    PredictionRecord, RegressionFit, RollingPredictor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reference series: (day, temperature, demand). The first 20 rows are the history.
#[rustfmt::skip]
const REFERENCE: [(f64, f64, f64); 26] = [
    (1.0, 21.5, 2357.85),   (2.0, 21.2, 2669.7),    (3.0, 22.1, 2669.7),
    (4.0, 25.1, 2998.05),   (5.0, 26.4, 3512.85),   (6.0, 22.6, 3542.55),
    (7.0, 17.7, 3248.85),   (8.0, 18.5, 3341.25),   (9.0, 21.2, 3453.45),
    (10.0, 20.3, 3598.65),  (11.0, 17.0, 3413.85),  (12.0, 19.2, 4271.85),
    (13.0, 19.4, 4393.95),  (14.0, 21.9, 3686.1),   (15.0, 25.5, 3682.8),
    (16.0, 26.3, 3550.8),   (17.0, 26.3, 4719.0),   (18.0, 24.7, 3979.35),
    (19.0, 21.4, 4131.6),   (20.0, 21.04, 4141.5),
    (21.0, 21.3, 4027.65),  (22.0, 23.0, 3986.4),   (23.0, 23.45, 3963.3),
    (24.0, 23.8, 4026.0),   (25.0, 21.42, 3936.9),  (26.0, 23.09, 3996.3),
];

const USAGE: &str = "Usage: rollfit [path.csv|path.json] [window=<n>] [initial=<n>] \
[critical=step|student] [interval=confidence|prediction] [precision=<n>] [--json] [plot=<file.svg>]";

struct Options {
    window: usize,
    initial: Option<usize>,
    critical: String,
    interval: IntervalKind,
    precision: usize,
    json: bool,
    plot: Option<String>,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollfit=warn".into()),
        )
        .init();

    let mut path = None;
    let mut options = Options {
        window: rollfit::DEFAULT_WINDOW_SIZE,
        initial: None,
        critical: "step".to_string(),
        interval: IntervalKind::Confidence,
        precision: 2,
        json: false,
        plot: None,
    };

    for arg in std::env::args().skip(1) {
        if arg == "help" || arg == "--help" || arg == "-h" {
            eprintln!("{USAGE}");
            std::process::exit(0);
        } else if arg == "--json" {
            options.json = true;
        } else if let Some(option) = arg.strip_prefix("window=") {
            options.window = parse_or_exit(option, "window");
        } else if let Some(option) = arg.strip_prefix("initial=") {
            options.initial = Some(parse_or_exit(option, "initial"));
        } else if let Some(option) = arg.strip_prefix("precision=") {
            options.precision = parse_or_exit(option, "precision");
        } else if let Some(option) = arg.strip_prefix("critical=") {
            options.critical = option.to_string();
        } else if let Some(option) = arg.strip_prefix("interval=") {
            options.interval = option.parse().unwrap_or_else(|err| {
                eprintln!("{err}");
                std::process::exit(1);
            });
        } else if let Some(option) = arg.strip_prefix("plot=") {
            options.plot = Some(option.to_string());
        } else if path.is_none() && !arg.contains('=') {
            path = Some(arg);
        } else {
            eprintln!("Unrecognized argument: {arg}\n{USAGE}");
            std::process::exit(1);
        }
    }

    let rows = match path {
        Some(path) => load_rows(Path::new(&path)),
        None => REFERENCE.to_vec(),
    };

    match options.critical.as_str() {
        "step" => run(&rows, &options, StepApproximation),
        "student" => run(&rows, &options, StudentT),
        other => {
            eprintln!("Unsupported critical value source: {other}");
            std::process::exit(1);
        }
    }
}

fn run(rows: &[(f64, f64, f64)], options: &Options, critical: impl CriticalValue + Copy) {
    let initial = options.initial.unwrap_or(options.window).min(rows.len());
    let observations: Vec<(f64, f64)> = rows.iter().map(|&(day, x, _)| (day, x)).collect();
    let targets: Vec<f64> = rows.iter().map(|&(_, _, y)| y).collect();
    let (history, new_observations) = observations.split_at(initial);
    let (history_targets, new_targets) = targets.split_at(initial);

    let fit = RegressionFit::with_critical(history, history_targets, &critical)
        .unwrap_or_else(|err| exit_with("Failed to fit the initial data", &err));

    let records: Vec<PredictionRecord> = RollingPredictor::builder()
        .window_size(options.window)
        .critical(critical)
        .interval(options.interval)
        .build(history, history_targets)
        .and_then(|mut predictor| predictor.run(new_observations, new_targets))
        .unwrap_or_else(|err| exit_with("Rolling forecast failed", &err));

    if options.json {
        let output = serde_json::json!({
            "equation": fit.equation(),
            "coefficients": fit.coefficients(),
            "coefficient_errors": fit.coefficient_standard_errors(),
            "diagnostics": fit.diagnostics(),
            "bands": fit.bands(),
            "forecasts": &records,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(err) => exit_with("Failed to serialize results", &err),
        }
    } else {
        print!("{}", Report::new(&fit, &records).precision(options.precision));
    }

    if let Some(target) = &options.plot {
        plot(target, &fit, &records);
    }
}

#[cfg(feature = "plotting")]
fn plot(target: &str, fit: &RegressionFit, records: &[PredictionRecord]) {
    let title = "Rolling-window forecast";
    if let Err(err) = rollfit::plot::plot_forecasts(target, title, fit, records, rollfit::plot::DEFAULT_SIZE) {
        exit_with("Failed to plot", &err);
    }
    eprintln!("Plot written to {target}");
}

#[cfg(not(feature = "plotting"))]
fn plot(_: &str, _: &RegressionFit, _: &[PredictionRecord]) {
    eprintln!("Plotting requires the `plotting` feature");
    std::process::exit(1);
}

fn load_rows(path: &Path) -> Vec<(f64, f64, f64)> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        eprintln!("Failed to read file: {}", path.display());
        std::process::exit(1);
    };

    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => {
            // Three columns: day, covariate, target. A header row is optional.
            fn parse_line(line: &str) -> Option<(f64, f64, f64)> {
                let mut parts = line.split(',').map(str::trim);
                let day = parts.next()?.parse().ok()?;
                let x = parts.next()?.parse().ok()?;
                let y = parts.next()?.parse().ok()?;
                Some((day, x, y))
            }

            let mut rows = Vec::new();
            for (i, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(line) {
                    Some(row) => rows.push(row),
                    None if i == 0 => {}
                    None => {
                        eprintln!("Failed to parse line {}: {}", i + 1, line);
                        std::process::exit(1);
                    }
                }
            }
            rows
        }

        Some("json") => serde_json::from_str(&contents).unwrap_or_else(|err| {
            eprintln!("Failed to parse JSON: {err}");
            std::process::exit(1);
        }),

        _ => {
            eprintln!("Unsupported file format: {}", path.display());
            std::process::exit(1);
        }
    }
}

fn parse_or_exit(value: &str, name: &str) -> usize {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {name} value: {value}");
        std::process::exit(1);
    })
}

fn exit_with(context: &str, err: &dyn std::error::Error) -> ! {
    eprintln!("{context}: {err}");
    std::process::exit(1);
}
