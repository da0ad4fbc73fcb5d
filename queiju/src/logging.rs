//! Diagnostics for the `queiju` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary (or to whatever application embeds the runner).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset, from the number of `-v` flags.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "queiju=info,warn",
        _ => "queiju=debug,info",
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the level. Stdout is left
/// to the captured QE output.
///
/// ```bash
/// RUST_LOG=queiju::io=trace queiju run pw.x --input scf.in
/// queiju -vv run bands.x --input bands.in
/// ```
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose > 1)
                .compact(),
        )
        .init();
}
