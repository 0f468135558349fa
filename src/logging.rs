use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::settings::BalloonSettings;

/// Initialise logging. `debug` level can be enabled via the settings file and
/// then overridden with `RUST_LOG`; otherwise the level is fixed at `info`.
///
/// When `log_file` is given, output goes to that file instead of stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Without debug logging `RUST_LOG` is ignored so a stray variable in the
    // user's environment cannot turn on verbose output.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_target = log_file.and_then(|path| {
        let dir = path.parent()?.to_path_buf();
        let name = path.file_name()?.to_os_string();
        Some((dir, name))
    });

    let _ = match file_target {
        Some((dir, name)) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(tracing_appender::rolling::never(dir, name))
            .try_init(),
        None => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
}

/// Initialise logging at the level chosen by `settings.debug_logging`.
pub fn init_from_settings(settings: &BalloonSettings, log_file: Option<PathBuf>) {
    init(settings.debug_logging, log_file)
}
