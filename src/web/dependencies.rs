use std::sync::Arc;

use axum::{
	body::Bytes,
	extract::*,
	http::{HeaderMap, StatusCode},
	response::Response,
	routing::*,
};
use serde::*;

use super::{
	common::*,
	records::{listing_page, PageQuery},
	Global,
};
use crate::{
	dependency::{BulkLinkDraft, LinkFilter},
	record::RecordKind,
	store::LinkRefs,
};


#[derive(Deserialize)]
struct LinkQuery {
	page: Option<String>,
	page_size: Option<String>,
	origem_tabela: Option<String>,
	prioridade: Option<String>,
	sem_prioridade: Option<String>,
	search: Option<String>,
}

#[derive(Deserialize)]
struct LinkBody {
	id_aud_sql: Option<IdValue>,
	id_aud_report: Option<IdValue>,
	id_aud_fv: Option<IdValue>,
}

#[derive(Deserialize)]
struct BulkLinkBody {
	origem_tipo: Option<String>,
	origem_id: Option<IdValue>,
	#[serde(default)]
	destinos: Vec<DestinationBody>,
	prioridade: Option<String>,
}

#[derive(Deserialize)]
struct DestinationBody {
	tipo: Option<String>,
	id: Option<IdValue>,
}


pub fn router() -> Router<Arc<Global>> {
	Router::new()
		.route("/", get(index).post(create))
		.route("/criar-multiplas", post(create_multiple))
		.route("/:id", get(show).delete(delete))
}


impl LinkQuery {
	fn filter(&self) -> LinkFilter {
		LinkFilter {
			// Unknown tables don't filter anything
			table: self
				.origem_tabela
				.as_deref()
				.and_then(|t| RecordKind::from_table(t).ok()),
			priority: self.prioridade.clone().filter(|p| !p.is_empty()),
			without_priority: self.sem_prioridade.as_deref() == Some("true"),
			search: self.search.clone().filter(|s| !s.is_empty()),
		}
	}
}

impl LinkBody {
	fn refs(&self) -> Result<LinkRefs, Response> {
		let parse = |field: &'static str, value: &Option<IdValue>| match value {
			None => Ok(None),
			Some(v) => match v.to_i64() {
				Some(id) => Ok(Some(id)),
				None => Err(bad_request_response(&format!("{} must be an integer", field))),
			},
		};
		Ok(LinkRefs {
			sql: parse("id_aud_sql", &self.id_aud_sql)?,
			report: parse("id_aud_report", &self.id_aud_report)?,
			formula: parse("id_aud_fv", &self.id_aud_fv)?,
		})
	}
}

impl From<BulkLinkBody> for BulkLinkDraft {
	fn from(body: BulkLinkBody) -> Self {
		Self {
			origin_kind: body.origem_tipo,
			origin_key: body.origem_id.and_then(|id| id.to_i64()),
			destinations: body
				.destinos
				.into_iter()
				.map(|d| (d.tipo, d.id.and_then(|id| id.to_i64())))
				.collect(),
			priority: body.prioridade,
		}
	}
}


fn parse_id(id: &str) -> Result<i64, Response> {
	id.parse()
		.map_err(|_| not_found_error_response("Not found."))
}

async fn index(State(g): State<Arc<Global>>, Query(query): Query<LinkQuery>) -> Response {
	let page_query = PageQuery {
		page: query.page.clone(),
		page_size: query.page_size.clone(),
	};
	let page = match listing_page(&g, &page_query) {
		Ok(p) => p,
		Err(response) => return response,
	};
	match g.api.load_links(&query.filter(), &page).await {
		Ok(page) => ok_response(&page),
		Err(e) => api_error_response(e, "unable to load dependencies"),
	}
}

async fn create(State(g): State<Arc<Global>>, headers: HeaderMap, body: Bytes) -> Response {
	let refs = match parse_json_body::<LinkBody>(&body).and_then(|b| b.refs()) {
		Ok(r) => r,
		Err(response) => return response,
	};
	match g.api.create_link(&refs, user_id(&headers)).await {
		Ok(link) => json_response(StatusCode::CREATED, &link),
		Err(e) => api_error_response(e, "unable to create dependency"),
	}
}

async fn create_multiple(State(g): State<Arc<Global>>, headers: HeaderMap, body: Bytes) -> Response {
	let draft = match parse_json_body::<BulkLinkBody>(&body) {
		Ok(b) => BulkLinkDraft::from(b),
		Err(response) => return response,
	};
	match g.api.create_links(&draft, user_id(&headers)).await {
		Ok(outcome) => json_response(StatusCode::CREATED, &outcome),
		Err(e) => api_error_response(e, "unable to create dependencies"),
	}
}

async fn show(State(g): State<Arc<Global>>, Path(id): Path<String>) -> Response {
	let id = match parse_id(&id) {
		Ok(id) => id,
		Err(response) => return response,
	};
	match g.api.load_link(id).await {
		Ok(link) => ok_response(&link),
		Err(e) => api_error_response(e, "unable to load dependency"),
	}
}

async fn delete(State(g): State<Arc<Global>>, Path(id): Path<String>) -> Response {
	let id = match parse_id(&id) {
		Ok(id) => id,
		Err(response) => return response,
	};
	match g.api.delete_link(id).await {
		Ok(()) => no_content_response(),
		Err(e) => api_error_response(e, "unable to delete dependency"),
	}
}
