use log::LevelFilter;

/// Installs the global logger. `--debug` lowers the default level to
/// `debug`; `RUST_LOG` still overrides either default.
pub(crate) fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
