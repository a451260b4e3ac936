use nix::sys::signal;

static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

extern "C" fn on_signal(_: nix::libc::c_int) {
	INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
}

/// Routes SIGINT and SIGTERM into [`interrupted`].
pub fn install() -> nix::Result<()> {
	let action = signal::SigAction::new(
		signal::SigHandler::Handler(on_signal),
		signal::SaFlags::SA_RESTART,
		signal::SigSet::empty(),
	);

	for kind in [signal::Signal::SIGINT, signal::Signal::SIGTERM] {
		unsafe { signal::sigaction(kind, &action)? };
	}

	Ok(())
}

pub fn interrupted() -> bool {
	INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}
