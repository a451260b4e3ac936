pub mod chain;
mod config;
pub mod discovery;
mod error;
pub mod frame;
pub mod gpu;
pub mod input;
mod signal;
pub mod state;
pub mod wayland;

pub use error::*;

use clap::Parser as _;

#[derive(clap::Parser)]
struct Args {
	/// JSON config file, defaults to `$XDG_CONFIG_HOME/glint/config.json`
	#[arg(short, long)]
	config: Option<std::path::PathBuf>,

	#[arg(long)]
	width: Option<i32>,

	#[arg(long)]
	height: Option<i32>,
}

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();

	let mut config = match args.config.or_else(config::Config::default_path) {
		Some(path) => config::Config::read_from(&path)?,
		None => config::Config::default(),
	};

	if let Some(width) = args.width {
		config.width = width;
	}

	if let Some(height) = args.height {
		config.height = height;
	}

	signal::install()?;

	run(&config)?;

	log::info!("shut down cleanly");
	Ok(())
}

/// Builds the whole chain, runs the frame loop and unwinds on return.
fn run(config: &config::Config) -> Result<()> {
	let viewport = state::Viewport::new(config.width, config.height);

	let conn = chain::acquire(
		"display connection",
		wayland_client::Connection::connect_to_env,
		drop,
	)?;

	let queue = conn.new_event_queue::<wayland::App>();
	let qh = queue.handle();

	let discovery::Services {
		compositor,
		shell,
		seat: _seat,
	} = wayland::discover(&conn, &qh)?;

	let surface = chain::Link::new("surface", compositor.create_surface(&qh, ()), |x| {
		x.destroy()
	});

	let shell_surface = chain::Link::new(
		"shell surface",
		shell.get_shell_surface(&surface, &qh, ()),
		drop,
	);

	shell_surface.set_toplevel();
	shell_surface.set_title(config.title.clone());
	shell_surface.set_class(String::from("glint"));

	let window = gpu::window_handle(&surface);

	let display = gpu::open_display(&conn)?;
	let gpu_config = gpu::choose_config(&display, window)?;
	let render_surface = gpu::create_surface(&display, &gpu_config, window, viewport)?;
	let context = gpu::create_context(&display, &gpu_config, window, &render_surface)?;

	let renderer = chain::Link::new(
		"program",
		gpu::Renderer::create(gpu::load(&display), viewport, config.clear_color)?,
		gpu::Renderer::destroy,
	);

	let mut events = wayland::Wayland::new(
		&conn,
		queue,
		wayland::App::new(input::Router::new(viewport)),
	);

	let mut painter = gpu::Gpu {
		surface: &render_surface,
		context: &context,
		renderer: &renderer,
	};

	log::info!("rendering at {}x{}", viewport.width, viewport.height);

	match frame::run(&mut events, &mut painter, signal::interrupted) {
		frame::Termination::Interrupted => Ok(()),
		frame::Termination::Failed(e) => {
			log::error!("frame loop failed: {e}");
			Err(e)
		}
	}
}
