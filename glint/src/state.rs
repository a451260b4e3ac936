pub const TOUCH_SLOTS: usize = 10;

pub const POINTER_HIDDEN: [f32; 2] = [-100.0, -100.0];
pub const TOUCH_INACTIVE: [f32; 2] = [-256.0, -256.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
	pub width: i32,
	pub height: i32,
}

impl Viewport {
	pub fn new(width: i32, height: i32) -> Self {
		Self { width, height }
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
	pub position: [f32; 2],
	pub held: bool,
}

impl Default for Pointer {
	fn default() -> Self {
		Self {
			position: POINTER_HIDDEN,
			held: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Touches {
	slots: [[f32; 2]; TOUCH_SLOTS],
}

impl Default for Touches {
	fn default() -> Self {
		Self {
			slots: [TOUCH_INACTIVE; TOUCH_SLOTS],
		}
	}
}

impl Touches {
	/// Slot for a protocol contact id, `None` when it does not fit the table.
	pub fn slot_mut(&mut self, id: i32) -> Option<&mut [f32; 2]> {
		let index = usize::try_from(id).ok()?;
		self.slots.get_mut(index)
	}

	#[cfg(test)]
	pub fn get(&self, index: usize) -> Option<[f32; 2]> {
		self.slots.get(index).copied()
	}

	pub fn as_array(&self) -> &[[f32; 2]; TOUCH_SLOTS] {
		&self.slots
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererState {
	pub viewport: Viewport,
	pub pointer: Pointer,
	pub touches: Touches,
}

impl RendererState {
	pub fn new(viewport: Viewport) -> Self {
		Self {
			viewport,
			pointer: Pointer::default(),
			touches: Touches::default(),
		}
	}

	pub fn uniforms(&self) -> Uniforms {
		Uniforms {
			resolution: [self.viewport.width as f32, self.viewport.height as f32],
			pointer: self.pointer.position,
			touches: *self.touches.as_array(),
		}
	}
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
	pub resolution: [f32; 2],
	pub pointer: [f32; 2],
	pub touches: [[f32; 2]; TOUCH_SLOTS],
}

impl Uniforms {
	pub fn touches_flat(&self) -> &[f32] {
		bytemuck::cast_slice(&self.touches)
	}
}
