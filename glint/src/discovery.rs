use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
	Compositor,
	Shell,
	Seat,
}

impl Service {
	pub fn from_interface(interface: &str) -> Option<Self> {
		match interface {
			"wl_compositor" => Some(Self::Compositor),
			"wl_shell" => Some(Self::Shell),
			"wl_seat" => Some(Self::Seat),
			_ => None,
		}
	}

	pub fn interface(self) -> &'static str {
		match self {
			Self::Compositor => "wl_compositor",
			Self::Shell => "wl_shell",
			Self::Seat => "wl_seat",
		}
	}

	/// Highest version this client speaks.
	pub fn version(self) -> u32 {
		match self {
			Self::Compositor => 1,
			Self::Shell => 1,
			// release requests on wl_seat and its devices
			Self::Seat => 5,
		}
	}
}

pub trait Bind {
	type Compositor;
	type Shell;
	type Seat;

	fn compositor(&mut self, name: u32, version: u32) -> Self::Compositor;
	fn shell(&mut self, name: u32, version: u32) -> Self::Shell;
	fn seat(&mut self, name: u32, version: u32) -> Self::Seat;
}

#[derive(Debug)]
pub struct Services<C, S, T> {
	pub compositor: C,
	pub shell: S,
	pub seat: T,
}

pub struct Discovery<C, S, T> {
	compositor: Option<C>,
	shell: Option<S>,
	seat: Option<T>,
}

impl<C, S, T> Default for Discovery<C, S, T> {
	fn default() -> Self {
		Self {
			compositor: None,
			shell: None,
			seat: None,
		}
	}
}

impl<C, S, T> Discovery<C, S, T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn global<B>(
		&mut self,
		binder: &mut B,
		name: u32,
		interface: &str,
		version: u32,
	) -> Option<Service>
	where
		B: Bind<Compositor = C, Shell = S, Seat = T>,
	{
		let service = Service::from_interface(interface)?;
		let version = version.min(service.version());

		let bound = match service {
			Service::Compositor => {
				bind_once(&mut self.compositor, || binder.compositor(name, version))
			}
			Service::Shell => bind_once(&mut self.shell, || binder.shell(name, version)),
			Service::Seat => bind_once(&mut self.seat, || binder.seat(name, version)),
		};

		if bound {
			log::debug!("bound {interface} v{version} (global {name})");
			Some(service)
		} else {
			log::debug!("ignoring duplicate {interface} (global {name})");
			None
		}
	}

	pub fn global_remove(&mut self, _name: u32) {}

	pub fn finish(self) -> Result<Services<C, S, T>> {
		let missing = |service: Service| Error::MissingService {
			interface: service.interface(),
		};

		Ok(Services {
			compositor: self.compositor.ok_or_else(|| missing(Service::Compositor))?,
			shell: self.shell.ok_or_else(|| missing(Service::Shell))?,
			seat: self.seat.ok_or_else(|| missing(Service::Seat))?,
		})
	}
}

fn bind_once<H>(slot: &mut Option<H>, bind: impl FnOnce() -> H) -> bool {
	if slot.is_some() {
		return false;
	}

	*slot = Some(bind());
	true
}
