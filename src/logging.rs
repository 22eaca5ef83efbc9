// Logger setup.
// The TUI owns the terminal, so interactive sessions log to a file; headless
// modes log to stderr. RUST_LOG overrides the default `info` level.

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::error::Result;

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder
}

/// Log to stderr.
pub fn init_stderr() {
    // A logger may already be installed (tests, repeated init); keep the first.
    let _ = builder().target(Target::Stderr).try_init();
}

/// Append log records to the file at `path`.
pub fn init_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = builder()
        .target(Target::Pipe(Box::new(file)))
        .write_style(env_logger::WriteStyle::Never)
        .try_init();
    Ok(())
}
