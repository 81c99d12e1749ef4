//! Process hardening for commands that hold private keys
//!
//! Seed phrases and keyfiles pass through the forge and bulk signer. A crash
//! must not write them to disk, so the CLI disables core dumps at startup.
//! Failure is logged, not fatal: containers and unprivileged users may not
//! permit it.

use std::sync::atomic::{AtomicBool, Ordering};

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Returns `true` once core dumps are off. A failed attempt is retried on
/// the next call.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.load(Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    {
        let disabled = unix::disable_core_dumps_impl();
        CORE_DUMPS_DISABLED.store(disabled, Ordering::SeqCst);
        disabled
    }

    #[cfg(not(unix))]
    {
        log::warn!("core dump prevention is not supported on this platform");
        false
    }
}

#[cfg(unix)]
mod unix {
    pub fn disable_core_dumps_impl() -> bool {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit only reads the struct we pass by reference.
        let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
        if result != 0 {
            log::warn!(
                "failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }
}
