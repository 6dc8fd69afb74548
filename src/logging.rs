use flexi_logger::{Logger, LoggerHandle};

use crate::error::Result;

/// Start the stderr logger. `RUST_LOG` wins over `spec` when set.
///
/// Keep the returned handle alive for the lifetime of the process.
pub fn init(spec: &str) -> Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(spec)?
        .log_to_stderr()
        .format_for_stderr(flexi_logger::detailed_format)
        .start()?;
    log::info!("logging started, spec `{spec}`");
    Ok(handle)
}
