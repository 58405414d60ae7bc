use serde::*;


/// The file path of the system-wide configuration file
#[cfg(target_family = "unix")]
pub const CONFIG_FILE_PATH: &str = "/etc/audtrack/config.toml";
#[cfg(target_family = "windows")]
pub const CONFIG_FILE_PATH: &str = "C:\\Program Files\\audtrack\\config.toml";
/// A configuration file in the working directory takes precedence over the
/// system-wide one.
pub const CONFIG_FILE_LOCAL_PATH: &str = "config.toml";
/// Environment variable that, if set, points to the configuration file to use.
pub const CONFIG_FILE_ENV: &str = "AUDTRACK_CONFIG";

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_NOTIFICATION_LIMIT: u64 = 120;
pub const MAX_NOTIFICATION_LIMIT: u64 = 300;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub database_path: String,

	pub web_interface_address: Option<String>,
	pub web_interface_port: Option<u16>,

	pub default_page_size: Option<u64>,
	pub max_page_size: Option<u64>,
	pub notification_limit: Option<u64>,
	pub notification_max_limit: Option<u64>,

	pub cors_allow_all: Option<bool>,
}


impl Config {
	pub fn default_page_size(&self) -> u64 {
		self.default_page_size
			.filter(|s| *s > 0)
			.unwrap_or(DEFAULT_PAGE_SIZE)
	}

	pub fn max_page_size(&self) -> u64 {
		self.max_page_size
			.filter(|s| *s > 0)
			.unwrap_or(MAX_PAGE_SIZE)
	}

	pub fn notification_limit(&self) -> u64 {
		self.notification_limit
			.filter(|l| *l > 0)
			.unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
	}

	pub fn notification_max_limit(&self) -> u64 {
		self.notification_max_limit
			.filter(|l| *l > 0)
			.unwrap_or(MAX_NOTIFICATION_LIMIT)
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			database_path: String::default(),
			web_interface_address: None,
			web_interface_port: None,
			default_page_size: None,
			max_page_size: None,
			notification_limit: None,
			notification_max_limit: None,
			cors_allow_all: None,
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_config() {
		let config: Config = toml::from_str(
			r#"
			database_path = "/tmp/audtrack.sqlite"
			web_interface_port = 8080
			max_page_size = 0
			"#,
		)
		.unwrap();
		assert_eq!(config.database_path, "/tmp/audtrack.sqlite");
		assert_eq!(config.web_interface_port, Some(8080));
		assert_eq!(config.default_page_size(), DEFAULT_PAGE_SIZE);
		// Zero is not a usable page size, so the default applies
		assert_eq!(config.max_page_size(), MAX_PAGE_SIZE);
		assert_eq!(config.notification_max_limit(), MAX_NOTIFICATION_LIMIT);
	}
}
