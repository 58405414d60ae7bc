use std::sync::Arc;

use axum::{extract::*, response::Response, routing::*};

use super::{common::*, Global};
use crate::record::RecordKind;


pub fn router() -> Router<Arc<Global>> {
	Router::new()
		.route("/sql", get(|g: State<Arc<Global>>| records(RecordKind::Sql, g)))
		.route("/report", get(|g: State<Arc<Global>>| records(RecordKind::Report, g)))
		.route("/fv", get(|g: State<Arc<Global>>| records(RecordKind::Formula, g)))
		.route("/dependencias", get(links))
		.route("/prioridades", get(priorities))
}


async fn records(kind: RecordKind, State(g): State<Arc<Global>>) -> Response {
	match g.api.count_records(kind).await {
		Ok(count) => ok_response(&count),
		Err(e) => api_error_response(e, "unable to count records"),
	}
}

async fn links(State(g): State<Arc<Global>>) -> Response {
	match g.api.count_links().await {
		Ok(count) => ok_response(&count),
		Err(e) => api_error_response(e, "unable to count dependencies"),
	}
}

async fn priorities(State(g): State<Arc<Global>>) -> Response {
	match g.api.count_priorities().await {
		Ok(breakdown) => ok_response(&breakdown),
		Err(e) => api_error_response(e, "unable to count priorities"),
	}
}
