use crate::{Error, Result};

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
	pub width: i32,
	pub height: i32,
	pub title: String,
	pub clear_color: [f32; 4],
}

impl Default for Config {
	fn default() -> Self {
		Self {
			width: 1500,
			height: 1000,
			title: String::from("glint"),
			clear_color: [0.0, 0.8, 0.0, 0.8],
		}
	}
}

impl Config {
	pub fn default_path() -> Option<std::path::PathBuf> {
		let base = std::env::var_os("XDG_CONFIG_HOME")
			.map(std::path::PathBuf::from)
			.or_else(|| {
				std::env::var_os("HOME").map(|x| std::path::PathBuf::from(x).join(".config"))
			})?;

		Some(base.join("glint").join("config.json"))
	}

	/// A missing file yields the defaults; a malformed one is an error.
	pub fn read_from(path: &std::path::Path) -> Result<Self> {
		let config_file = match std::fs::read_to_string(path) {
			Ok(x) => x,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(e) => return Err(Error::acquisition("config", format!("{}: {e}", path.display()))),
		};

		Self::parse(&config_file)
			.map_err(|e| Error::acquisition("config", format!("{}: {e}", path.display())))
	}

	pub fn parse(input: &str) -> serde_json::Result<Self> {
		serde_json::from_str(input)
	}
}
