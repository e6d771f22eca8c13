// Process-wide setup.
//
// Nothing in the library installs a logger on its own; binaries and test
// harnesses call `init()` once at startup. Repeated calls are no-ops.
// Verbosity follows `RUST_LOG` and defaults to `info`.

use std::sync::Once;

static INIT: Once = Once::new();

pub fn init() {
    INIT.call_once(|| {
        // A logger installed by someone else wins.
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    });
}
