//! SIGINT/SIGTERM handling for the coordinator process (§4.5 step 2, §9
//! "do not model SIGINT as an exception — model it as a cooperative poll").
use crate::worker::WorkerRecord;
use nix::sys::signal::{kill, raise, signal, SigHandler, Signal};

extern "C" fn handle_interrupt(_: libc::c_int) {
    mm_core::request_interrupt();
}

/// Install handlers that only flip the cooperative flag polled by the
/// multiplex loop; all real work (forwarding, draining, re-raising) happens
/// back in ordinary control flow once the loop notices the flag.
pub fn install() {
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::Handler(handle_interrupt));
        let _ = signal(Signal::SIGTERM, SigHandler::Handler(handle_interrupt));
    }
}

/// Forward SIGTERM to every non-finished worker (§4.5 step 2b).
pub fn terminate_workers(workers: &[WorkerRecord]) {
    for worker in workers.iter().filter(|w| !w.finished) {
        let _ = kill(worker.pid, Signal::SIGTERM);
    }
}

/// Restore the default disposition and re-raise, so the process's exit
/// status reflects the signal that interrupted it (§4.5 step 2c, §6 exit codes).
pub fn reraise_and_exit(sig: Signal) -> ! {
    unsafe {
        let _ = signal(sig, SigHandler::SigDfl);
    }
    let _ = raise(sig);
    // unreachable if raise() actually delivers the (now-default) signal, but
    // a belt-and-braces exit keeps this function's `-> !` honest.
    std::process::exit(128 + sig as i32);
}
