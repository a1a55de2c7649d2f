use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger. `verbose` lowers the default level to debug;
/// `RUST_LOG` still wins when set.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let _ = Builder::from_env(env).try_init();
}
