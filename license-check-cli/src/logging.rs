//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter directive for a `-v` count: warnings by default, then info,
/// debug and trace for the library.
#[must_use]
pub fn directive_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,license_check=info",
        2 => "warn,license_check=debug",
        _ => "warn,license_check=trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `-v` when set.
///
/// Log lines go to stderr so that `--format json` output stays parseable.
pub fn init(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive_for(verbose)));

    // A second init (tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
