// CarScope - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or any EnvFilter directive)
//   - CLI flag: --debug (debug for CarScope itself, warn elsewhere)
//   - Config file: [logging] level = "debug"
//
// Output: stderr, so stdout stays clean for tables and --json output.

use super::constants;
use tracing_subscriber::EnvFilter;

/// Directive used when --debug is given and RUST_LOG is not set.
const DEBUG_DIRECTIVE: &str = "warn,carscope=debug";

/// Pick the filter directive. `None` means "read RUST_LOG".
///
/// Priority: RUST_LOG > --debug > config level > default "info".
fn directive(rust_log_set: bool, debug_flag: bool, config_level: Option<&str>) -> Option<String> {
    if rust_log_set {
        None
    } else if debug_flag {
        Some(DEBUG_DIRECTIVE.to_string())
    } else {
        Some(config_level.unwrap_or(constants::DEFAULT_LOG_LEVEL).to_string())
    }
}

/// Initialise the logging subsystem. A second call is a no-op.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let rust_log_set = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let filter = match directive(rust_log_set, debug_flag, config_level) {
        Some(d) => EnvFilter::new(d),
        None => EnvFilter::from_default_env(),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug_flag)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            app = constants::APP_NAME,
            version = constants::APP_VERSION,
            "Logging initialised"
        );
    }
}
