use std::{
	env, fmt,
	fs::File,
	io::{self, prelude::*},
	path::{Path, PathBuf},
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
};

use audtrackd::{
	api::Api,
	config::{self, Config},
	db::Database,
	migration::Migrations,
	web,
};
use log::*;
use signal_hook::flag;


fn config_path() -> PathBuf {
	if let Some(path) = env::var_os(config::CONFIG_FILE_ENV) {
		return PathBuf::from(path);
	}
	let local_path = PathBuf::from(config::CONFIG_FILE_LOCAL_PATH);
	if local_path.exists() {
		return local_path;
	}
	PathBuf::from(config::CONFIG_FILE_PATH)
}

fn initialize_logging() {
	if let Some(filename) = env::var_os("SYSTEM_LOG_FILE") {
		if let Err(e) = simple_logging::log_to_file(&filename, LevelFilter::Debug) {
			eprintln!("Unable to log to {:?}: {}", filename, e);
			env_logger::init();
		}
	} else {
		env_logger::init()
	}
}

fn load_config<P>(path: P) -> Option<Config>
where
	P: AsRef<Path> + fmt::Debug,
{
	let mut file = match File::open(&path) {
		Err(e) => match e.kind() {
			io::ErrorKind::NotFound => {
				error!("Config file {:?} not found!", path);
				return None;
			}
			_ => {
				error!("Unable to open config file {:?}: {}", path, e);
				return None;
			}
		},
		Ok(f) => f,
	};

	let mut content = String::new();
	if let Err(e) = file.read_to_string(&mut content) {
		error!("Unable to read config file {:?}: {}", path, e);
		return None;
	}

	match toml::from_str(&content) {
		Err(e) => {
			error!("Unable to parse config file {:?}: {}", path, e);
			None
		}
		Ok(c) => Some(c),
	}
}

async fn load_database(config: &Config) -> io::Result<Database> {
	// If the folder doesn't exist yet, create it
	let db_path = PathBuf::from(&config.database_path);
	if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
		tokio::fs::create_dir_all(parent).await?;
	}

	Database::load(db_path)
		.await
		.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

fn register_stop_flag() -> io::Result<Arc<AtomicBool>> {
	let stop_flag = Arc::new(AtomicBool::new(false));
	flag::register(signal_hook::consts::SIGINT, stop_flag.clone())?;
	flag::register(signal_hook::consts::SIGTERM, stop_flag.clone())?;
	let stop_flag2 = stop_flag.clone();
	ctrlc::set_handler(move || {
		stop_flag2.store(true, Ordering::Relaxed);
	})
	.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
	Ok(stop_flag)
}

#[tokio::main]
async fn main() {
	initialize_logging();

	let config_path = config_path();
	let config = match load_config(&config_path) {
		Some(c) => c,
		None => return,
	};
	info!("Loaded config from {:?}", config_path);

	// Catch signals
	let stop_flag = match register_stop_flag() {
		Ok(f) => f,
		Err(e) => {
			error!("Unable to register signal handlers: {}", e);
			return;
		}
	};

	let db = match load_database(&config).await {
		Ok(db) => db,
		Err(e) => {
			error!("Unable to load database: {}", e);
			return;
		}
	};

	// Run migrations (does nothing if there is nothing to migrate)
	if let Err(e) = Migrations::load().run(&db).await {
		error!("Unable to migrate database: {:?}", e);
		return;
	}

	let api = Api::new(db);
	let server = tokio::spawn(web::serve(stop_flag, api, config));
	match server.await {
		Ok(Ok(())) => info!("Exiting..."),
		Ok(Err(e)) => error!("HTTP server error: {}", e),
		Err(e) => error!("HTTP server task failed: {}", e),
	}
}
