use crate::state::{RendererState, Viewport, POINTER_HIDDEN, TOUCH_INACTIVE};

/// `wl_fixed_t`: 24.8 signed fixed point.
pub type Fixed = fixed::types::I24F8;

/// Reply owed to the compositor for a `ping`.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong(pub u32);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
	pub pointer: bool,
	pub keyboard: bool,
	pub touch: bool,
}

impl Capabilities {
	pub fn from_bits(bits: u32) -> Self {
		Self {
			pointer: bits & 1 != 0,
			keyboard: bits & 2 != 0,
			touch: bits & 4 != 0,
		}
	}
}

pub trait InputSink {
	fn ping(&mut self, serial: u32) -> Pong;
	fn configure(&mut self, edges: u32, width: i32, height: i32);
	fn popup_done(&mut self) {}

	fn capabilities(&mut self, capabilities: Capabilities);

	fn pointer_enter(&mut self, x: Fixed, y: Fixed);
	fn pointer_leave(&mut self);
	fn pointer_motion(&mut self, x: Fixed, y: Fixed);
	fn pointer_button(&mut self, button: u32, pressed: bool);
	fn pointer_axis(&mut self) {}

	fn touch_down(&mut self, id: i32, x: Fixed, y: Fixed);
	fn touch_motion(&mut self, id: i32, x: Fixed, y: Fixed);
	fn touch_up(&mut self, id: i32);
	fn touch_frame(&mut self) {}
	fn touch_cancel(&mut self) {}
}

pub struct Router {
	state: RendererState,
	capabilities: Capabilities,
	last_pointer: Option<(Fixed, Fixed)>,
	buttons: Vec<u32>,
}

impl Router {
	pub fn new(viewport: Viewport) -> Self {
		Self {
			state: RendererState::new(viewport),
			capabilities: Capabilities::default(),
			last_pointer: None,
			buttons: Vec::new(),
		}
	}

	pub fn state(&self) -> &RendererState {
		&self.state
	}

	pub fn seat_capabilities(&self) -> Capabilities {
		self.capabilities
	}

	/// Surface-local input coordinates to render space (origin bottom left).
	fn to_render_space(&self, x: Fixed, y: Fixed) -> [f32; 2] {
		[
			x.to_num::<f32>(),
			self.state.viewport.height as f32 - y.to_num::<f32>(),
		]
	}

	fn show_pointer_at_last(&mut self) {
		self.state.pointer.position = match self.last_pointer {
			Some((x, y)) => self.to_render_space(x, y),
			None => POINTER_HIDDEN,
		};
	}
}

impl InputSink for Router {
	fn ping(&mut self, serial: u32) -> Pong {
		log::trace!("ping {serial}");
		Pong(serial)
	}

	fn configure(&mut self, edges: u32, width: i32, height: i32) {
		log::debug!("configure {width}x{height} (edges {edges:#x})");

		if width <= 0 || height <= 0 {
			return;
		}

		self.state.viewport = Viewport::new(width, height);
	}

	fn popup_done(&mut self) {
		log::debug!("popup done");
	}

	fn capabilities(&mut self, capabilities: Capabilities) {
		if capabilities.pointer {
			log::info!("pointer device found");
		}

		if capabilities.keyboard {
			log::info!("keyboard device found");
		}

		if capabilities.touch {
			log::info!("touch device found");
		}

		self.capabilities = capabilities;
	}

	fn pointer_enter(&mut self, x: Fixed, y: Fixed) {
		log::debug!("pointer entered surface at {x},{y}");
		self.last_pointer = Some((x, y));
	}

	fn pointer_leave(&mut self) {
		log::debug!("pointer left surface");

		self.last_pointer = None;
		self.buttons.clear();
		self.state.pointer.held = false;
		self.state.pointer.position = POINTER_HIDDEN;
	}

	fn pointer_motion(&mut self, x: Fixed, y: Fixed) {
		self.last_pointer = Some((x, y));

		self.state.pointer.position = if self.state.pointer.held {
			self.to_render_space(x, y)
		} else {
			POINTER_HIDDEN
		};
	}

	fn pointer_button(&mut self, button: u32, pressed: bool) {
		log::trace!("pointer button {button:#x} pressed: {pressed}");

		if !pressed {
			self.buttons.retain(|&x| x != button);
		} else if !self.buttons.contains(&button) {
			self.buttons.push(button);
		}

		// latched while any button is down
		self.state.pointer.held = !self.buttons.is_empty();

		if self.state.pointer.held {
			self.show_pointer_at_last();
		} else {
			self.state.pointer.position = POINTER_HIDDEN;
		}
	}

	fn pointer_axis(&mut self) {
		log::trace!("pointer axis");
	}

	fn touch_down(&mut self, id: i32, x: Fixed, y: Fixed) {
		log::trace!("touch {id} down at {x},{y}");
	}

	fn touch_motion(&mut self, id: i32, x: Fixed, y: Fixed) {
		let position = self.to_render_space(x, y);

		let Some(slot) = self.state.touches.slot_mut(id) else {
			log::warn!("ignoring motion of touch contact {id}");
			return;
		};

		*slot = position;
	}

	fn touch_up(&mut self, id: i32) {
		let Some(slot) = self.state.touches.slot_mut(id) else {
			log::warn!("ignoring release of touch contact {id}");
			return;
		};

		*slot = TOUCH_INACTIVE;
	}
}
