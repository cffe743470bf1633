use std::time::Instant;

use tracing_log_format::formatter::{Formatter, JsonFormatter};
use tracing_log_format::record::{Level, LogRecord};

fn main() {
    let formatter = JsonFormatter::new(
        [
            ("time", "%(asctime)s"),
            ("level", "%(levelname)s"),
            ("logger", "%(name)s"),
            ("where", "%(filename)s:%(lineno)d"),
            ("message", "%(message)s"),
        ],
        "%Y-%m-%dT%H:%M:%S%.3f",
        false,
    )
    .expect("valid templates");

    let n: u64 = 100_000;
    let mut bytes = 0usize;
    let start = Instant::now();

    for i in 0..n {
        let mut record = LogRecord::new(Level::Error, "load", "iteration {} failed")
            .with_args([i])
            .with_location("examples_load/json_load.rs", 27);
        bytes += formatter.format(&mut record).len();
    }

    let elapsed = start.elapsed();
    println!(
        "json formatter: rendered {} records ({} bytes) in {:?} (~{:.0} rec/s)",
        n,
        bytes,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
