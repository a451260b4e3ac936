pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to acquire {resource}: {reason}")]
	AcquisitionFailed {
		resource: &'static str,
		reason: String,
	},

	#[error("compositor does not advertise '{interface}'")]
	MissingService { interface: &'static str },

	#[error("failed to compile {stage} shader:\n{log}")]
	CompileFailed { stage: &'static str, log: String },

	#[error("failed to link program:\n{log}")]
	LinkFailed { log: String },

	#[error("event dispatch failed: {0}")]
	Dispatch(#[from] wayland_client::DispatchError),

	#[error("wayland connection failed: {0}")]
	Wayland(#[from] wayland_client::backend::WaylandError),

	#[error(transparent)]
	Gl(#[from] glutin::error::Error),

	#[error("{0}")]
	Gpu(String),
}

impl Error {
	pub fn acquisition(resource: &'static str, reason: impl std::fmt::Display) -> Self {
		Self::AcquisitionFailed {
			resource,
			reason: reason.to_string(),
		}
	}
}
