use std::sync::Arc;

use axum::{extract::*, response::Response, routing::*};
use serde::*;

use super::{common::*, Global};
use crate::{common::*, record::RecordKind};


#[derive(Deserialize)]
pub struct PageQuery {
	pub page: Option<String>,
	pub page_size: Option<String>,
}

#[derive(Deserialize)]
struct ModalQuery {
	tabela: Option<String>,
}


pub fn router() -> Router<Arc<Global>> {
	Router::new()
		.route(
			"/sql",
			get(|g: State<Arc<Global>>, q: Query<PageQuery>| index(RecordKind::Sql, g, q)),
		)
		.route(
			"/sql/:id",
			get(|g: State<Arc<Global>>, p: Path<String>| show(RecordKind::Sql, g, p)),
		)
		.route(
			"/reports",
			get(|g: State<Arc<Global>>, q: Query<PageQuery>| index(RecordKind::Report, g, q)),
		)
		.route(
			"/reports/:id",
			get(|g: State<Arc<Global>>, p: Path<String>| show(RecordKind::Report, g, p)),
		)
		.route(
			"/fv",
			get(|g: State<Arc<Global>>, q: Query<PageQuery>| index(RecordKind::Formula, g, q)),
		)
		.route(
			"/fv/:id",
			get(|g: State<Arc<Global>>, p: Path<String>| show(RecordKind::Formula, g, p)),
		)
		.route("/registros-modal", get(modal))
}


/// Parses the paging parameters shared by the paginated listings.
pub fn listing_page(g: &Global, query: &PageQuery) -> Result<PageRequest, Response> {
	PageRequest::parse_listing(
		query.page.as_deref(),
		query.page_size.as_deref(),
		g.config.default_page_size(),
		g.config.max_page_size(),
	)
	.map_err(|_| not_found_error_response("Invalid page."))
}

async fn index(kind: RecordKind, State(g): State<Arc<Global>>, Query(query): Query<PageQuery>) -> Response {
	let page = match listing_page(&g, &query) {
		Ok(p) => p,
		Err(response) => return response,
	};
	match g.api.load_records(kind, &page).await {
		Ok(page) => ok_response(&page),
		Err(e) => api_error_response(e, "unable to load records"),
	}
}

async fn show(kind: RecordKind, State(g): State<Arc<Global>>, Path(id): Path<String>) -> Response {
	let key = match id.parse::<i64>() {
		Ok(k) => k,
		Err(_) => return not_found_error_response("Not found."),
	};
	match g.api.load_record(kind, key).await {
		Ok(row) => ok_response(&row),
		Err(e) => api_error_response(e, "unable to load record"),
	}
}

async fn modal(State(g): State<Arc<Global>>, Query(query): Query<ModalQuery>) -> Response {
	let kind = match RecordKind::from_table(query.tabela.as_deref().unwrap_or_default()) {
		Ok(k) => k,
		Err(_) => return bad_request_response("invalid table, use one of: AUD_SQL, AUD_REPORT or AUD_FV"),
	};
	match g.api.load_modal_entries(kind).await {
		Ok(entries) => ok_response(&entries),
		Err(e) => api_error_response(e, "unable to load records"),
	}
}
