//! Log output for the binary

use tracing::Level;

/// Install the global fmt subscriber; `debug` lowers the level to DEBUG.
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
