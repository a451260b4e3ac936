use wayland_client::{
	protocol::{
		wl_compositor::WlCompositor,
		wl_pointer::{self, WlPointer},
		wl_registry::{self, WlRegistry},
		wl_seat::{self, WlSeat},
		wl_shell::WlShell,
		wl_shell_surface::{self, WlShellSurface},
		wl_surface::WlSurface,
		wl_touch::{self, WlTouch},
	},
	Connection, Dispatch, EventQueue, Proxy as _, QueueHandle, WEnum,
};

use crate::{
	chain::Link,
	discovery::{Bind, Discovery, Services},
	frame,
	input::{Capabilities, Fixed, InputSink as _, Pong, Router},
	state::RendererState,
	Result,
};

pub struct App {
	pub router: Router,
	pointer: Option<Link<WlPointer>>,
	touch: Option<Link<WlTouch>>,
}

impl App {
	pub fn new(router: Router) -> Self {
		Self {
			router,
			pointer: None,
			touch: None,
		}
	}

	fn attach_devices(
		&mut self,
		seat: &WlSeat,
		capabilities: Capabilities,
		qh: &QueueHandle<Self>,
	) {
		if capabilities.pointer && self.pointer.is_none() {
			self.pointer = Some(Link::new("pointer", seat.get_pointer(qh, ()), |pointer| {
				if pointer.version() >= 3 {
					pointer.release();
				}
			}));
		}

		if capabilities.touch && self.touch.is_none() {
			self.touch = Some(Link::new("touch", seat.get_touch(qh, ()), |touch| {
				if touch.version() >= 3 {
					touch.release();
				}
			}));
		}
	}
}

fn fixed(value: f64) -> Fixed {
	Fixed::saturating_from_num(value)
}

impl Dispatch<WlShellSurface, ()> for App {
	fn event(
		state: &mut Self,
		shell_surface: &WlShellSurface,
		event: wl_shell_surface::Event,
		_: &(),
		_: &Connection,
		_: &QueueHandle<Self>,
	) {
		match event {
			wl_shell_surface::Event::Ping { serial } => {
				let Pong(serial) = state.router.ping(serial);
				shell_surface.pong(serial);
			}
			wl_shell_surface::Event::Configure {
				edges,
				width,
				height,
			} => {
				let edges = match edges {
					WEnum::Value(x) => x.bits(),
					WEnum::Unknown(x) => x,
				};

				state.router.configure(edges, width, height);
			}
			wl_shell_surface::Event::PopupDone => state.router.popup_done(),
			_ => {}
		}
	}
}

impl Dispatch<WlSeat, ()> for App {
	fn event(
		state: &mut Self,
		seat: &WlSeat,
		event: wl_seat::Event,
		_: &(),
		_: &Connection,
		qh: &QueueHandle<Self>,
	) {
		match event {
			wl_seat::Event::Capabilities { capabilities } => {
				let capabilities = Capabilities::from_bits(match capabilities {
					WEnum::Value(x) => x.bits(),
					WEnum::Unknown(x) => x,
				});

				state.router.capabilities(capabilities);
				state.attach_devices(seat, state.router.seat_capabilities(), qh);
			}
			wl_seat::Event::Name { name } => log::debug!("seat name: {name}"),
			_ => {}
		}
	}
}

impl Dispatch<WlPointer, ()> for App {
	fn event(
		state: &mut Self,
		_: &WlPointer,
		event: wl_pointer::Event,
		_: &(),
		_: &Connection,
		_: &QueueHandle<Self>,
	) {
		match event {
			wl_pointer::Event::Enter {
				surface_x,
				surface_y,
				..
			} => state.router.pointer_enter(fixed(surface_x), fixed(surface_y)),
			wl_pointer::Event::Leave { .. } => state.router.pointer_leave(),
			wl_pointer::Event::Motion {
				surface_x,
				surface_y,
				..
			} => state.router.pointer_motion(fixed(surface_x), fixed(surface_y)),
			wl_pointer::Event::Button {
				button,
				state: button_state,
				..
			} => {
				let pressed = matches!(
					button_state,
					WEnum::Value(wl_pointer::ButtonState::Pressed)
				);
				state.router.pointer_button(button, pressed);
			}
			wl_pointer::Event::Axis { .. } => state.router.pointer_axis(),
			_ => {}
		}
	}
}

impl Dispatch<WlTouch, ()> for App {
	fn event(
		state: &mut Self,
		_: &WlTouch,
		event: wl_touch::Event,
		_: &(),
		_: &Connection,
		_: &QueueHandle<Self>,
	) {
		match event {
			wl_touch::Event::Down { id, x, y, .. } => {
				state.router.touch_down(id, fixed(x), fixed(y))
			}
			wl_touch::Event::Motion { id, x, y, .. } => {
				state.router.touch_motion(id, fixed(x), fixed(y))
			}
			wl_touch::Event::Up { id, .. } => state.router.touch_up(id),
			wl_touch::Event::Frame => state.router.touch_frame(),
			wl_touch::Event::Cancel => state.router.touch_cancel(),
			_ => {}
		}
	}
}

wayland_client::delegate_noop!(App: WlCompositor);
wayland_client::delegate_noop!(App: WlShell);
wayland_client::delegate_noop!(App: ignore WlSurface);

struct Handshake {
	discovery: Discovery<Link<WlCompositor>, Link<WlShell>, Link<WlSeat>>,
	qh: QueueHandle<App>,
}

struct RegistryBinder<'a> {
	registry: &'a WlRegistry,
	qh: &'a QueueHandle<App>,
}

impl Bind for RegistryBinder<'_> {
	type Compositor = Link<WlCompositor>;
	type Shell = Link<WlShell>;
	type Seat = Link<WlSeat>;

	fn compositor(&mut self, name: u32, version: u32) -> Link<WlCompositor> {
		Link::new("compositor", self.registry.bind(name, version, self.qh, ()), drop)
	}

	fn shell(&mut self, name: u32, version: u32) -> Link<WlShell> {
		Link::new("shell", self.registry.bind(name, version, self.qh, ()), drop)
	}

	fn seat(&mut self, name: u32, version: u32) -> Link<WlSeat> {
		let seat: WlSeat = self.registry.bind(name, version, self.qh, ());

		Link::new("seat", seat, |seat| {
			if seat.version() >= 5 {
				seat.release();
			}
		})
	}
}

impl Dispatch<WlRegistry, ()> for Handshake {
	fn event(
		state: &mut Self,
		registry: &WlRegistry,
		event: wl_registry::Event,
		_: &(),
		_: &Connection,
		_: &QueueHandle<Self>,
	) {
		match event {
			wl_registry::Event::Global {
				name,
				interface,
				version,
			} => {
				let mut binder = RegistryBinder {
					registry,
					qh: &state.qh,
				};

				state.discovery.global(&mut binder, name, &interface, version);
			}
			wl_registry::Event::GlobalRemove { name } => state.discovery.global_remove(name),
			_ => {}
		}
	}
}

pub type BoundServices = Services<Link<WlCompositor>, Link<WlShell>, Link<WlSeat>>;

/// Binds the compositor, shell and seat globals onto `qh`'s queue.
pub fn discover(conn: &Connection, qh: &QueueHandle<App>) -> Result<BoundServices> {
	let mut queue = conn.new_event_queue::<Handshake>();
	let registry = Link::new("registry", conn.display().get_registry(&queue.handle(), ()), drop);

	let mut handshake = Handshake {
		discovery: Discovery::new(),
		qh: qh.clone(),
	};

	queue.roundtrip(&mut handshake)?;
	registry.release();

	// bound services unwind through their links when one is missing
	handshake.discovery.finish()
}

pub struct Wayland<'a> {
	conn: &'a Connection,
	queue: EventQueue<App>,
	app: App,
}

impl<'a> Wayland<'a> {
	pub fn new(conn: &'a Connection, queue: EventQueue<App>, app: App) -> Self {
		Self { conn, queue, app }
	}

	fn read_socket(&mut self) -> Result<()> {
		let Some(guard) = self.queue.prepare_read() else {
			return Ok(());
		};

		match guard.read() {
			Ok(_) => Ok(()),
			Err(wayland_client::backend::WaylandError::Io(e))
				if e.kind() == std::io::ErrorKind::WouldBlock =>
			{
				Ok(())
			}
			Err(e) => Err(e.into()),
		}
	}
}

impl frame::Events for Wayland<'_> {
	fn dispatch_pending(&mut self) -> Result<usize> {
		self.conn.flush()?;
		self.read_socket()?;

		let dispatched = self.queue.dispatch_pending(&mut self.app)?;

		// pongs and device requests queued by the callbacks
		self.conn.flush()?;

		Ok(dispatched)
	}

	fn state(&self) -> &RendererState {
		self.app.router.state()
	}
}
