mod common;
mod dependencies;
mod history;
mod insights;
mod notifications;
mod records;

use std::{
	io,
	net::*,
	sync::{atomic::*, Arc},
	time::Duration,
};

use axum::Router;
use log::*;
use tokio::time::sleep;
use tower_http::cors::CorsLayer;

use crate::{api::Api, config::Config};


pub struct Global {
	pub config: Config,
	pub api: Api,
}


/// Builds the complete HTTP interface.
pub fn router(global: Arc<Global>) -> Router {
	let mut router = Router::new()
		.merge(records::router())
		.nest("/dependencias", dependencies::router())
		.merge(history::router())
		.nest("/notificacoes", notifications::router())
		.nest("/insights", insights::router());
	if global.config.cors_allow_all.unwrap_or(false) {
		router = router.layer(CorsLayer::permissive());
	}
	router.with_state(global)
}

pub async fn serve(stop_flag: Arc<AtomicBool>, api: Api, config: Config) -> io::Result<()> {
	let ip = match &config.web_interface_address {
		None => IpAddr::V4(Ipv4Addr::LOCALHOST),
		Some(address) => address
			.parse()
			.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
	};
	let addr = SocketAddr::new(ip, config.web_interface_port.unwrap_or(8000));
	let global = Arc::new(Global { config, api });
	let app = router(global);

	let listener = tokio::net::TcpListener::bind(addr).await?;
	info!("Serving HTTP API on {}", addr);
	axum::serve(listener, app)
		.with_graceful_shutdown(async move {
			while !stop_flag.load(Ordering::Relaxed) {
				sleep(Duration::from_secs(1)).await;
			}
		})
		.await?;
	info!("HTTP API stopped");
	Ok(())
}
