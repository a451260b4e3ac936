use glow::HasContext as _;
use glutin::{
	context::{NotCurrentGlContext as _, PossiblyCurrentContext, PossiblyCurrentGlContext as _},
	display::GlDisplay as _,
	surface::{GlSurface as _, WindowSurface},
};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use wayland_client::{protocol::wl_surface::WlSurface, Connection, Proxy as _};

use crate::{
	chain::{self, Link},
	frame,
	state::{Uniforms, Viewport},
	Error, Result,
};

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
	pub position: [f32; 3],
}

const QUAD: [Vertex; 4] = [
	Vertex {
		position: [-1.0, 1.0, 0.0],
	},
	Vertex {
		position: [1.0, 1.0, 0.0],
	},
	Vertex {
		position: [1.0, -1.0, 0.0],
	},
	Vertex {
		position: [-1.0, -1.0, 0.0],
	},
];

pub fn display_handle(conn: &Connection) -> RawDisplayHandle {
	let mut handle = raw_window_handle::WaylandDisplayHandle::empty();
	handle.display = conn.backend().display_ptr() as *mut _;

	RawDisplayHandle::Wayland(handle)
}

pub fn window_handle(surface: &WlSurface) -> RawWindowHandle {
	let mut handle = raw_window_handle::WaylandWindowHandle::empty();
	handle.surface = surface.id().as_ptr() as *mut _;

	RawWindowHandle::Wayland(handle)
}

fn size(viewport: Viewport) -> Result<(std::num::NonZeroU32, std::num::NonZeroU32)> {
	let dimension = |x: i32| {
		u32::try_from(x)
			.ok()
			.and_then(std::num::NonZeroU32::new)
			.ok_or_else(|| {
				Error::Gpu(format!(
					"invalid surface size {}x{}",
					viewport.width, viewport.height
				))
			})
	};

	Ok((dimension(viewport.width)?, dimension(viewport.height)?))
}

pub fn open_display(conn: &Connection) -> Result<Link<glutin::display::Display>> {
	chain::acquire(
		"gpu display",
		|| unsafe {
			glutin::display::Display::new(
				display_handle(conn),
				glutin::display::DisplayApiPreference::Egl,
			)
		},
		drop,
	)
}

/// RGBA8888, window capable, GLES3 renderable.
pub fn choose_config(
	display: &glutin::display::Display,
	window: RawWindowHandle,
) -> Result<glutin::config::Config> {
	let template = glutin::config::ConfigTemplateBuilder::new()
		.with_buffer_type(glutin::config::ColorBufferType::Rgb {
			r_size: 8,
			g_size: 8,
			b_size: 8,
		})
		.with_alpha_size(8)
		.with_surface_type(glutin::config::ConfigSurfaceTypes::WINDOW)
		.with_api(glutin::config::Api::GLES3)
		.compatible_with_native_window(window)
		.build();

	let mut configs = unsafe { display.find_configs(template) }
		.map_err(|e| Error::acquisition("gpu config", e))?;

	configs
		.next()
		.ok_or_else(|| Error::acquisition("gpu config", "no matching config"))
}

pub fn create_surface(
	display: &glutin::display::Display,
	config: &glutin::config::Config,
	window: RawWindowHandle,
	viewport: Viewport,
) -> Result<Link<glutin::surface::Surface<WindowSurface>>> {
	let (width, height) = size(viewport)?;

	let attributes = glutin::surface::SurfaceAttributesBuilder::<WindowSurface>::new()
		.build(window, width, height);

	chain::acquire(
		"render surface",
		|| unsafe { display.create_window_surface(config, &attributes) },
		drop,
	)
}

pub fn create_context(
	display: &glutin::display::Display,
	config: &glutin::config::Config,
	window: RawWindowHandle,
	surface: &glutin::surface::Surface<WindowSurface>,
) -> Result<Link<PossiblyCurrentContext>> {
	let attributes = glutin::context::ContextAttributesBuilder::new()
		.with_context_api(glutin::context::ContextApi::Gles(Some(
			glutin::context::Version::new(2, 0),
		)))
		.build(Some(window));

	let context = chain::acquire(
		"render context",
		|| {
			unsafe { display.create_context(config, &attributes) }
				.and_then(|x| x.make_current(surface))
		},
		|context| {
			if let Err(e) = context.make_not_current() {
				log::warn!("failed to release render context: {e}");
			}
		},
	)?;

	surface.set_swap_interval(
		&context,
		glutin::surface::SwapInterval::Wait(std::num::NonZeroU32::MIN),
	)?;

	Ok(context)
}

pub fn load(display: &glutin::display::Display) -> glow::Context {
	unsafe { glow::Context::from_loader_function_cstr(|x| display.get_proc_address(x)) }
}

pub struct Program {
	program: glow::NativeProgram,
	resolution: Option<glow::NativeUniformLocation>,
	pointer: Option<glow::NativeUniformLocation>,
	touches: Option<glow::NativeUniformLocation>,
}

fn compiled(stage: &'static str, status: bool, log: String) -> Result<()> {
	if !status {
		return Err(Error::CompileFailed { stage, log });
	}

	if !log.trim().is_empty() {
		log::debug!("{stage} shader log:\n{log}");
	}

	Ok(())
}

fn linked(status: bool, log: impl FnOnce() -> String) -> Result<()> {
	if !status {
		return Err(Error::LinkFailed { log: log() });
	}

	Ok(())
}

/// Compiles the vertex stage, then the fragment stage; a vertex shader is
/// handed to `delete` when the fragment stage fails.
fn stages<S>(
	vertex: impl FnOnce() -> Result<S>,
	fragment: impl FnOnce() -> Result<S>,
	delete: impl FnOnce(S),
) -> Result<(S, S)> {
	let vertex = vertex()?;

	match fragment() {
		Ok(fragment) => Ok((vertex, fragment)),
		Err(e) => {
			delete(vertex);
			Err(e)
		}
	}
}

fn compile(
	glow: &glow::Context,
	kind: u32,
	stage: &'static str,
	source: &str,
) -> Result<glow::NativeShader> {
	unsafe {
		let shader = glow.create_shader(kind).map_err(Error::Gpu)?;

		glow.shader_source(shader, source);
		glow.compile_shader(shader);

		let status = glow.get_shader_compile_status(shader);

		if let Err(e) = compiled(stage, status, glow.get_shader_info_log(shader)) {
			glow.delete_shader(shader);
			log::error!("{stage} shader source:\n{source}");

			return Err(e);
		}

		Ok(shader)
	}
}

impl Program {
	fn link(glow: &glow::Context) -> Result<Self> {
		unsafe {
			let (vertex_shader, fragment_shader) = stages(
				|| {
					compile(
						glow,
						glow::VERTEX_SHADER,
						"vertex",
						include_str!("vertex_shader.glsl"),
					)
				},
				|| {
					compile(
						glow,
						glow::FRAGMENT_SHADER,
						"fragment",
						include_str!("fragment_shader.glsl"),
					)
				},
				|x| glow.delete_shader(x),
			)?;

			let program = match glow.create_program() {
				Ok(x) => x,
				Err(e) => {
					glow.delete_shader(vertex_shader);
					glow.delete_shader(fragment_shader);
					return Err(Error::Gpu(e));
				}
			};

			glow.attach_shader(program, vertex_shader);
			glow.attach_shader(program, fragment_shader);

			glow.bind_attrib_location(program, 0, "position");
			glow.link_program(program);

			glow.delete_shader(vertex_shader);
			glow.delete_shader(fragment_shader);

			let status = glow.get_program_link_status(program);

			if let Err(e) = linked(status, || glow.get_program_info_log(program)) {
				glow.delete_program(program);
				return Err(e);
			}

			Ok(Self {
				program,
				resolution: glow.get_uniform_location(program, "resolution"),
				pointer: glow.get_uniform_location(program, "pointer"),
				touches: glow.get_uniform_location(program, "touches"),
			})
		}
	}
}

pub struct Renderer {
	glow: glow::Context,
	program: Program,
	quad: glow::NativeBuffer,
}

impl Renderer {
	pub fn create(glow: glow::Context, viewport: Viewport, clear_color: [f32; 4]) -> Result<Self> {
		let program = Program::link(&glow)?;

		let quad = unsafe {
			let quad = match glow.create_buffer() {
				Ok(x) => x,
				Err(e) => {
					glow.delete_program(program.program);
					return Err(Error::Gpu(e));
				}
			};

			glow.bind_buffer(glow::ARRAY_BUFFER, Some(quad));
			glow.buffer_data_u8_slice(
				glow::ARRAY_BUFFER,
				bytemuck::cast_slice(&QUAD[..]),
				glow::STATIC_DRAW,
			);

			glow.vertex_attrib_pointer_f32(
				0,
				3,
				glow::FLOAT,
				false,
				std::mem::size_of::<Vertex>() as _,
				0,
			);

			glow.enable_vertex_attrib_array(0);

			let [r, g, b, a] = clear_color;
			glow.clear_color(r, g, b, a);
			glow.front_face(glow::CW);
			glow.viewport(0, 0, viewport.width, viewport.height);

			quad
		};

		Ok(Self {
			glow,
			program,
			quad,
		})
	}

	pub fn destroy(self) {
		unsafe {
			self.glow.delete_buffer(self.quad);
			self.glow.delete_program(self.program.program);
		}
	}

	fn set_viewport(&self, viewport: Viewport) {
		unsafe { self.glow.viewport(0, 0, viewport.width, viewport.height) }
	}

	fn draw(&self, uniforms: &Uniforms) -> Result<()> {
		let program = &self.program;

		unsafe {
			self.glow.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

			self.glow.use_program(Some(program.program));

			self.glow.uniform_2_f32_slice(program.resolution.as_ref(), &uniforms.resolution);
			self.glow.uniform_2_f32_slice(program.pointer.as_ref(), &uniforms.pointer);
			self.glow.uniform_2_f32_slice(program.touches.as_ref(), uniforms.touches_flat());

			self.glow.bind_buffer(glow::ARRAY_BUFFER, Some(self.quad));
			self.glow.draw_arrays(glow::TRIANGLE_FAN, 0, QUAD.len() as _);

			match self.glow.get_error() {
				glow::NO_ERROR => Ok(()),
				code => Err(Error::Gpu(format!("draw failed with GL error {code:#x}"))),
			}
		}
	}
}

pub struct Gpu<'a> {
	pub surface: &'a glutin::surface::Surface<WindowSurface>,
	pub context: &'a PossiblyCurrentContext,
	pub renderer: &'a Renderer,
}

impl frame::Painter for Gpu<'_> {
	fn resize(&mut self, viewport: Viewport) -> Result<()> {
		let (width, height) = size(viewport)?;

		self.surface.resize(self.context, width, height);
		self.renderer.set_viewport(viewport);

		log::debug!("resized to {}x{}", viewport.width, viewport.height);
		Ok(())
	}

	fn draw(&mut self, uniforms: &Uniforms) -> Result<()> {
		self.renderer.draw(uniforms)
	}

	fn present(&mut self) -> Result<()> {
		Ok(self.surface.swap_buffers(self.context)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quad_covers_clip_space_as_a_fan() {
		let corners = QUAD.map(|x| [x.position[0], x.position[1]]);

		assert_eq!(corners, [[-1.0, 1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]]);
		assert_eq!(bytemuck::cast_slice::<_, u8>(&QUAD[..]).len(), 4 * 3 * 4);
	}

	#[test]
	fn rejects_empty_surface_sizes() {
		assert!(size(Viewport::new(800, 600)).is_ok());
		assert!(matches!(size(Viewport::new(0, 600)), Err(Error::Gpu(_))));
		assert!(matches!(size(Viewport::new(800, -1)), Err(Error::Gpu(_))));
	}

	#[test]
	fn failed_compile_carries_stage_and_log() {
		let result = compiled("fragment", false, String::from("0:3: 'vec5' : syntax error"));

		let Err(Error::CompileFailed { stage, log }) = result else {
			panic!("expected a compile failure");
		};

		assert_eq!(stage, "fragment");
		assert!(log.contains("syntax error"));

		assert!(compiled("vertex", true, String::from("warning: unused")).is_ok());
		assert!(compiled("vertex", true, String::new()).is_ok());
	}

	#[test]
	fn failed_link_carries_log() {
		let result = linked(false, || String::from("varying mismatch"));
		assert!(matches!(result, Err(Error::LinkFailed { log }) if log == "varying mismatch"));

		assert!(linked(true, || unreachable!("log read for a linked program")).is_ok());
	}

	#[test]
	fn fragment_failure_deletes_the_vertex_shader() {
		let deleted = std::cell::RefCell::new(Vec::new());

		let result = stages(
			|| Ok(1u32),
			|| {
				Err(Error::CompileFailed {
					stage: "fragment",
					log: String::new(),
				})
			},
			|x| deleted.borrow_mut().push(x),
		);

		assert!(matches!(result, Err(Error::CompileFailed { stage: "fragment", .. })));
		assert_eq!(*deleted.borrow(), vec![1]);
	}

	#[test]
	fn vertex_failure_skips_the_fragment_stage() {
		let result = stages(
			|| {
				Err::<u32, _>(Error::CompileFailed {
					stage: "vertex",
					log: String::new(),
				})
			},
			|| unreachable!("fragment compiled after vertex failure"),
			|_| unreachable!("nothing to delete"),
		);

		assert!(matches!(result, Err(Error::CompileFailed { stage: "vertex", .. })));
		assert_eq!(stages(|| Ok(1), || Ok(2), drop).unwrap(), (1, 2));
	}

	#[test]
	fn shaders_declare_the_uploaded_uniforms() {
		let fragment = include_str!("fragment_shader.glsl");

		assert!(fragment.contains("uniform vec2 resolution;"));
		assert!(fragment.contains("uniform vec2 pointer;"));
		assert!(fragment.contains(&format!(
			"uniform vec2 touches[{}];",
			crate::state::TOUCH_SLOTS
		)));
		assert!(include_str!("vertex_shader.glsl").contains("attribute vec4 position;"));
	}
}
