use crate::{Error, Result};

pub struct Link<T> {
	name: &'static str,
	inner: Option<(T, Box<dyn FnOnce(T)>)>,
}

impl<T> Link<T> {
	pub fn new(name: &'static str, value: T, release: impl FnOnce(T) + 'static) -> Self {
		log::debug!("acquired {name}");

		Self {
			name,
			inner: Some((value, Box::new(release))),
		}
	}

	/// Runs the releaser now instead of at scope end.
	pub fn release(mut self) {
		self.release_inner();
	}

	fn release_inner(&mut self) {
		if let Some((value, release)) = self.inner.take() {
			log::debug!("releasing {}", self.name);
			release(value);
		}
	}

	fn get(&self) -> &T {
		// `inner` is only emptied by `release_inner`, after which the link is gone.
		match &self.inner {
			Some((value, _)) => value,
			None => unreachable!("link '{}' used after release", self.name),
		}
	}

	fn get_mut(&mut self) -> &mut T {
		match &mut self.inner {
			Some((value, _)) => value,
			None => unreachable!("link '{}' used after release", self.name),
		}
	}
}

impl<T> std::ops::Deref for Link<T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		self.get()
	}
}

impl<T> std::ops::DerefMut for Link<T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.get_mut()
	}
}

impl<T> Drop for Link<T> {
	fn drop(&mut self) {
		self.release_inner()
	}
}

pub fn acquire<T, E: std::fmt::Display>(
	name: &'static str,
	factory: impl FnOnce() -> std::result::Result<T, E>,
	release: impl FnOnce(T) + 'static,
) -> Result<Link<T>> {
	match factory() {
		Ok(value) => Ok(Link::new(name, value, release)),
		Err(reason) => {
			log::error!("failed to acquire {name}: {reason}");
			Err(Error::acquisition(name, reason))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::{cell::RefCell, rc::Rc};

	type Journal = Rc<RefCell<Vec<&'static str>>>;

	const NAMES: [&str; 5] = ["connection", "compositor", "surface", "context", "program"];

	fn step(journal: &Journal, index: usize, fail_at: usize) -> Result<Link<usize>> {
		let journal = journal.clone();

		acquire(
			NAMES[index],
			|| {
				if index + 1 == fail_at {
					Err("refused")
				} else {
					Ok(index)
				}
			},
			move |_| journal.borrow_mut().push(NAMES[index]),
		)
	}

	fn startup(journal: &Journal, fail_at: usize) -> Result<()> {
		let _connection = step(journal, 0, fail_at)?;
		let _compositor = step(journal, 1, fail_at)?;
		let _surface = step(journal, 2, fail_at)?;
		let _context = step(journal, 3, fail_at)?;
		let _program = step(journal, 4, fail_at)?;

		Ok(())
	}

	#[test]
	fn failure_releases_earlier_links_in_reverse() {
		for fail_at in 1..=NAMES.len() {
			let journal = Journal::default();

			let Err(Error::AcquisitionFailed { resource, .. }) = startup(&journal, fail_at) else {
				panic!("step {fail_at} should have failed");
			};

			assert_eq!(resource, NAMES[fail_at - 1]);

			let expected = NAMES[..fail_at - 1].iter().rev().copied().collect::<Vec<_>>();
			assert_eq!(*journal.borrow(), expected);
		}
	}

	#[test]
	fn success_releases_everything_once_in_reverse() {
		let journal = Journal::default();

		startup(&journal, usize::MAX).unwrap();

		let expected = NAMES.iter().rev().copied().collect::<Vec<_>>();
		assert_eq!(*journal.borrow(), expected);
	}

	#[test]
	fn early_release_does_not_repeat_on_drop() {
		let count = Rc::new(RefCell::new(0));
		let counter = count.clone();

		let link = Link::new("registry", 7u32, move |value| {
			assert_eq!(value, 7);
			*counter.borrow_mut() += 1;
		});

		assert_eq!(*link, 7);

		link.release();
		assert_eq!(*count.borrow(), 1);
	}

	#[test]
	fn deref_mut_reaches_the_value() {
		let mut link = Link::new("viewport", vec![1, 2], drop);
		link.push(3);

		assert_eq!(link.as_slice(), &[1, 2, 3]);
	}
}
