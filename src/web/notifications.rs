use std::sync::Arc;

use axum::{extract::*, response::Response, routing::*};
use serde::*;

use super::{common::*, Global};
use crate::notification::sanitize_limit;


#[derive(Deserialize)]
struct NotificationQuery {
	limit: Option<String>,
	somente_nao_lidas: Option<String>,
}


pub fn router() -> Router<Arc<Global>> {
	Router::new()
		.route("/", get(index))
		.route("/:uid/lida", post(mark_read))
}


async fn index(State(g): State<Arc<Global>>, Query(query): Query<NotificationQuery>) -> Response {
	let limit = sanitize_limit(
		query.limit.as_deref(),
		g.config.notification_limit() as usize,
		g.config.notification_max_limit() as usize,
	);
	let unread_only = query
		.somente_nao_lidas
		.map(|v| v.to_lowercase() == "true")
		.unwrap_or(false);

	match g.api.load_notifications(limit, unread_only).await {
		Ok(notifications) => ok_response(&notifications),
		Err(e) => api_error_response(e, "unable to load notifications"),
	}
}

async fn mark_read(State(g): State<Arc<Global>>, Path(uid): Path<String>) -> Response {
	match g.api.mark_notification_read(&uid).await {
		Ok(receipt) => ok_response(&receipt),
		Err(e) => api_error_response(e, "unable to mark notification as read"),
	}
}
