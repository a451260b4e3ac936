use crate::{
	state::{RendererState, Uniforms, Viewport},
	Error, Result,
};

pub trait Events {
	/// Runs every callback that is ready without waiting for new ones.
	fn dispatch_pending(&mut self) -> Result<usize>;
	fn state(&self) -> &RendererState;
}

pub trait Painter {
	fn resize(&mut self, viewport: Viewport) -> Result<()>;
	fn draw(&mut self, uniforms: &Uniforms) -> Result<()>;
	/// Blocks until the compositor takes the frame.
	fn present(&mut self) -> Result<()>;
}

#[derive(Debug)]
pub enum Termination {
	Interrupted,
	Failed(Error),
}

pub fn run(
	events: &mut impl Events,
	painter: &mut impl Painter,
	interrupted: impl Fn() -> bool,
) -> Termination {
	let mut applied = events.state().viewport;
	let mut frames = 0u64;

	let result = loop {
		if interrupted() {
			break Ok(());
		}

		if let Err(e) = frame(events, painter, &mut applied) {
			break Err(e);
		}

		frames += 1;
	};

	log::info!("frame loop stopped after {frames} frames");

	match result {
		Ok(()) => Termination::Interrupted,
		Err(e) => Termination::Failed(e),
	}
}

fn frame(
	events: &mut impl Events,
	painter: &mut impl Painter,
	applied: &mut Viewport,
) -> Result<()> {
	let dispatched = events.dispatch_pending()?;

	if dispatched > 0 {
		log::trace!("dispatched {dispatched} events");
	}

	let state = events.state();

	if state.viewport != *applied {
		painter.resize(state.viewport)?;
		*applied = state.viewport;
	}

	painter.draw(&state.uniforms())?;
	painter.present()
}

#[cfg(test)]
mod tests {
	use std::{cell::RefCell, collections::VecDeque, rc::Rc};

	use super::*;
	use crate::input::{Fixed, InputSink as _, Router};

	enum Input {
		Ping(u32),
		Configure(i32, i32),
		Button(bool),
		Motion(i32, i32),
	}

	#[derive(Debug, PartialEq)]
	enum Op {
		Pong(u32),
		Resize(Viewport),
		Draw(Uniforms),
		Present,
	}

	type Journal = Rc<RefCell<Vec<Op>>>;

	struct Script {
		router: Router,
		batches: VecDeque<Vec<Input>>,
		journal: Journal,
	}

	impl Events for Script {
		fn dispatch_pending(&mut self) -> Result<usize> {
			let batch = self.batches.pop_front().unwrap_or_default();
			let count = batch.len();

			for input in batch {
				match input {
					Input::Ping(serial) => {
						let pong = self.router.ping(serial);
						self.journal.borrow_mut().push(Op::Pong(pong.0));
					}
					Input::Configure(width, height) => self.router.configure(0, width, height),
					Input::Button(pressed) => self.router.pointer_button(0x110, pressed),
					Input::Motion(x, y) => {
						self.router.pointer_motion(Fixed::from_bits(x), Fixed::from_bits(y))
					}
				}
			}

			Ok(count)
		}

		fn state(&self) -> &RendererState {
			self.router.state()
		}
	}

	struct Recorder {
		journal: Journal,
		fail_present_at: Option<usize>,
		presents: usize,
	}

	impl Painter for Recorder {
		fn resize(&mut self, viewport: Viewport) -> Result<()> {
			self.journal.borrow_mut().push(Op::Resize(viewport));
			Ok(())
		}

		fn draw(&mut self, uniforms: &Uniforms) -> Result<()> {
			self.journal.borrow_mut().push(Op::Draw(*uniforms));
			Ok(())
		}

		fn present(&mut self) -> Result<()> {
			self.presents += 1;

			if Some(self.presents) == self.fail_present_at {
				return Err(Error::Gpu(String::from("swap failed")));
			}

			self.journal.borrow_mut().push(Op::Present);
			Ok(())
		}
	}

	fn fixture(
		batches: Vec<Vec<Input>>,
		fail_present_at: Option<usize>,
	) -> (Script, Recorder, Journal) {
		let journal = Journal::default();

		let script = Script {
			router: Router::new(Viewport::new(1500, 1000)),
			batches: batches.into(),
			journal: journal.clone(),
		};

		let recorder = Recorder {
			journal: journal.clone(),
			fail_present_at,
			presents: 0,
		};

		(script, recorder, journal)
	}

	fn frames(limit: usize) -> impl Fn() -> bool {
		let count = std::cell::Cell::new(0);

		move || {
			let current = count.get();
			count.set(current + 1);
			current >= limit
		}
	}

	#[test]
	fn pong_precedes_the_present_of_its_frame() {
		let (mut script, mut recorder, journal) =
			fixture(vec![vec![], vec![Input::Ping(77)]], None);

		let termination = run(&mut script, &mut recorder, frames(3));
		assert!(matches!(termination, Termination::Interrupted));

		let journal = journal.borrow();
		let pongs = journal.iter().filter(|x| **x == Op::Pong(77)).count();
		assert_eq!(pongs, 1);

		let pong = journal.iter().position(|x| *x == Op::Pong(77)).unwrap();
		let presents = journal
			.iter()
			.enumerate()
			.filter(|(_, x)| **x == Op::Present)
			.map(|(index, _)| index)
			.collect::<Vec<_>>();

		assert_eq!(presents.len(), 3);
		assert!(presents[0] < pong && pong < presents[1]);
	}

	#[test]
	fn configure_reaches_the_next_upload() {
		let (mut script, mut recorder, journal) =
			fixture(vec![vec![Input::Configure(800, 600)]], None);

		run(&mut script, &mut recorder, frames(2));

		let journal = journal.borrow();

		assert_eq!(journal[0], Op::Resize(Viewport::new(800, 600)));

		let draws = journal
			.iter()
			.filter_map(|x| match x {
				Op::Draw(uniforms) => Some(uniforms.resolution),
				_ => None,
			})
			.collect::<Vec<_>>();

		assert_eq!(draws, vec![[800.0, 600.0], [800.0, 600.0]]);

		let resizes = journal.iter().filter(|x| matches!(x, Op::Resize(_))).count();
		assert_eq!(resizes, 1);
	}

	#[test]
	fn uploads_whole_pointer_updates() {
		let (mut script, mut recorder, journal) = fixture(
			vec![
				vec![Input::Motion(2560, 5120)],
				vec![Input::Button(true), Input::Motion(2560, 5120)],
			],
			None,
		);

		run(&mut script, &mut recorder, frames(2));

		let pointers = journal
			.borrow()
			.iter()
			.filter_map(|x| match x {
				Op::Draw(uniforms) => Some(uniforms.pointer),
				_ => None,
			})
			.collect::<Vec<_>>();

		assert_eq!(pointers, vec![[-100.0, -100.0], [10.0, 980.0]]);
	}

	#[test]
	fn failure_ends_the_loop() {
		let (mut script, mut recorder, journal) = fixture(vec![], Some(2));

		let termination = run(&mut script, &mut recorder, || false);

		assert!(matches!(termination, Termination::Failed(Error::Gpu(_))));

		let presents = journal.borrow().iter().filter(|x| **x == Op::Present).count();
		assert_eq!(presents, 1);
	}

	#[test]
	fn interruption_before_the_first_frame_draws_nothing() {
		let (mut script, mut recorder, journal) = fixture(vec![], None);

		let termination = run(&mut script, &mut recorder, || true);

		assert!(matches!(termination, Termination::Interrupted));
		assert!(journal.borrow().is_empty());
	}
}
