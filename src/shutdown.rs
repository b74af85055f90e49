use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static HALT_REQUESTED: AtomicBool = AtomicBool::new(false);
static SIGNAL: AtomicI32 = AtomicI32::new(0);

/// Polled by the run loop between instructions.
pub fn halt_requested() -> bool {
    HALT_REQUESTED.load(Ordering::SeqCst)
}

pub fn request_halt() {
    HALT_REQUESTED.store(true, Ordering::SeqCst);
}

/// The first signal that requested a halt, if any.
pub fn signal_received() -> Option<i32> {
    match SIGNAL.load(Ordering::SeqCst) {
        0 => None,
        sig => Some(sig),
    }
}

fn record_signal(sig: i32) {
    let _ = SIGNAL.compare_exchange(0, sig, Ordering::SeqCst, Ordering::SeqCst);
    request_halt();
}

#[cfg(unix)]
pub fn install() {
    use std::os::raw::c_int;
    const SIGINT: c_int = 2;
    const SIGTERM: c_int = 15;

    extern "C" fn handler(sig: c_int) {
        // Atomics only in signal context.
        record_signal(sig);
    }

    extern "C" {
        fn signal(sig: c_int, handler: extern "C" fn(c_int)) -> usize;
    }

    unsafe {
        let _ = signal(SIGINT, handler);
        let _ = signal(SIGTERM, handler);
    }
}

#[cfg(not(unix))]
pub fn install() {
    #[cfg(target_os = "windows")]
    unsafe {
        type HandlerRoutine = extern "system" fn(u32) -> i32;
        extern "system" {
            fn SetConsoleCtrlHandler(handler: Option<HandlerRoutine>, add: i32) -> i32;
        }
        extern "system" fn handler(_ctrl_type: u32) -> i32 {
            record_signal(2);
            1
        }
        let _ = SetConsoleCtrlHandler(Some(handler), 1);
    }
}
