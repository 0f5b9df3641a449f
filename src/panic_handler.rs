use log::error;
use std::panic;

/// Installs the process panic hook: `better-panic` backtraces in debug builds,
/// `human-panic` crash reports in release builds. The panic message is also
/// written to the log so it survives in `--log-file` output.
pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();

    #[cfg(not(debug_assertions))]
    human_panic::setup_panic!(Metadata::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            error!("Panic: {msg}");
        } else if let Some(msg) = panic_info.payload().downcast_ref::<String>() {
            error!("Panic: {msg}");
        } else {
            error!("Panic with unknown payload");
        }
        default_hook(panic_info);
    }));
}

#[cfg(not(debug_assertions))]
use human_panic::Metadata;
