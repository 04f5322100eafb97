//! `tsvi <config.json>`: compute TSVI for one surface file.
//!
//! Log filtering comes from `TSVI_LOG` in `env_logger` syntax (`debug`,
//! `wss_tsvi::io=trace`, ...; default `info`).

use std::process::ExitCode;
use wss_tsvi::config::TsviConfig;
use wss_tsvi::pipeline::run_config;

/// Environment variable holding the `env_logger` filter.
const LOG_ENV: &str = "TSVI_LOG";

fn logger() -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "info"))
}

fn main() -> ExitCode {
    logger().init();
    let mut args = std::env::args().skip(1);
    let (Some(path), None) = (args.next(), args.next()) else {
        eprintln!("usage: tsvi <config.json>");
        return ExitCode::from(2);
    };

    let result = TsviConfig::from_path(&path).and_then(|config| {
        let report = run_config(&config)?;
        Ok((config, report))
    });
    match result {
        Ok((config, report)) => {
            let d = &report.diagnostics;
            log::info!(
                "{} -> {}: {} samples, {} zero-magnitude vectors, {} degenerate triangles, {} non-finite TSVI values",
                config.input_path.display(),
                config.output_path.display(),
                report.samples,
                d.degenerate_vectors.len(),
                d.degenerate_faces.len(),
                d.non_finite_vertices.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
