#![forbid(unsafe_code)]

//! `frep` binary entry point.

use frep_harness::cli::Opts;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let opts = Opts::parse();
    init_logging();

    match frep_harness::run(&opts) {
        Ok(report) => {
            if opts.json {
                match report.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Failed to encode report: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                print!("{}", report.render(opts.dump));
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Log to stderr, filtered by `FREP_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("FREP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
