use std::sync::Arc;

use axum::{
	body::Bytes,
	extract::*,
	http::HeaderMap,
	response::Response,
	routing::*,
};
use serde::*;

use super::{common::*, Global};
use crate::{api::ObservationDraft, common::*, history::HistoryFilter, record::RecordKind};


#[derive(Deserialize)]
struct HistoryQuery {
	page: Option<String>,
	page_size: Option<String>,
	data_inicio: Option<String>,
	data_fim: Option<String>,
	tabela: Option<String>,
}

#[derive(Deserialize)]
struct CompareQuery {
	tabela: Option<String>,
	id: Option<String>,
	data_modificacao: Option<String>,
}

#[derive(Deserialize)]
struct ObservationBody {
	tabela: Option<String>,
	id: Option<IdValue>,
	texto: Option<String>,
	prioridade: Option<String>,
}


pub fn router() -> Router<Arc<Global>> {
	Router::new()
		.route("/historico-alteracoes", get(index))
		.route("/comparar-registros", get(compare))
		.route("/adicionar-observacao-registro", post(add_observation))
}


fn parse_table(table: &str) -> Result<RecordKind, Response> {
	RecordKind::from_table(table)
		.map_err(|_| bad_request_response("invalid table, use one of: AUD_SQL, AUD_REPORT or AUD_FV"))
}

async fn index(State(g): State<Arc<Global>>, Query(query): Query<HistoryQuery>) -> Response {
	let table = match query.tabela.as_deref().filter(|t| !t.is_empty()) {
		None => None,
		Some(t) => match parse_table(t) {
			Ok(kind) => Some(kind),
			Err(response) => return response,
		},
	};
	let page = match PageRequest::parse_strict(
		query.page.as_deref(),
		query.page_size.as_deref(),
		g.config.default_page_size(),
	) {
		Ok(p) => p,
		Err(_) => return bad_request_response("page and page_size must be positive integers"),
	};
	let filter = HistoryFilter::parse(
		query.data_inicio.as_deref(),
		query.data_fim.as_deref(),
		table,
	);

	match g.api.load_history(&filter, &page).await {
		Ok(page) => ok_response(&page),
		Err(e) => api_error_response(e, "unable to load history"),
	}
}

async fn compare(State(g): State<Arc<Global>>, Query(query): Query<CompareQuery>) -> Response {
	let (table, id) = match (
		query.tabela.as_deref().filter(|t| !t.is_empty()),
		query.id.as_deref().filter(|i| !i.is_empty()),
	) {
		(Some(t), Some(i)) => (t, i),
		_ => return bad_request_response("required fields: tabela, id"),
	};
	let kind = match parse_table(table) {
		Ok(k) => k,
		Err(response) => return response,
	};
	let key = match id.trim().parse::<i64>() {
		Ok(k) => k,
		Err(_) => return bad_request_response("id must be an integer"),
	};

	match g
		.api
		.compare(kind, key, query.data_modificacao.as_deref())
		.await
	{
		Ok(comparison) => ok_response(&comparison),
		Err(e) => api_error_response(e, "unable to compare records"),
	}
}

async fn add_observation(State(g): State<Arc<Global>>, headers: HeaderMap, body: Bytes) -> Response {
	let body = match parse_json_body::<ObservationBody>(&body) {
		Ok(b) => b,
		Err(response) => return response,
	};
	let key = match &body.id {
		None => None,
		Some(id) => match id.to_i64() {
			Some(k) => Some(k),
			None => return bad_request_response("id must be an integer"),
		},
	};
	let draft = ObservationDraft {
		table: body.tabela,
		key,
		text: body.texto,
		priority: body.prioridade,
	};

	match g.api.add_observation(&draft, user_id(&headers)).await {
		Ok(outcome) => ok_response(&outcome),
		Err(e) => api_error_response(e, "unable to add observation"),
	}
}
