mod app;
mod cli;

use std::fs::OpenOptions;
use std::sync::Mutex;

/// File-backed tracing when asked for; the TUI owns the terminal, so events
/// never go to stderr by default.
fn init_tracing() {
    let enabled = cfg!(feature = "dev-logging") || std::env::var_os("RUST_LOG").is_some();
    if !enabled {
        return;
    }

    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open("ffturn.log")
    else {
        return;
    };

    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = cli::parse();
    app::run(cli);
}
