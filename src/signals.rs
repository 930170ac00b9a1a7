use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SigHandler, Signal};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install handlers so Ctrl+C and SIGTERM request cancellation instead of
/// killing the process mid-delete.
///
/// The handler only sets a flag; callers poll [`interrupted`].
pub fn install_interrupt_handler() -> nix::Result<()> {
    // SAFETY: the handler only stores to an atomic, which is async-signal-safe
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_interrupt))?;
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_interrupt))?;
    }
    Ok(())
}

extern "C" fn handle_interrupt(_: i32) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Whether an interrupt arrived since startup.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
