use std::sync::Arc;

use audtrackd::{
	api::Api,
	config::Config,
	test::{self, RowSeed},
	web::{self, Global},
};
use axum::{
	body::{to_bytes, Body},
	http::{Method, Request, StatusCode},
	Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;


#[ctor::ctor]
fn initialize() { env_logger::init(); }

async fn load_router(filename: &str) -> Router {
	let api = Api::new(test::load_database(filename).await);
	test::insert_row(&api.db, RowSeed::sql(42, "Vendas").at("2025-01-01 10:00:00", None)).await;
	test::insert_row(&api.db, RowSeed::report(10, "R-10")).await;
	test::insert_row(&api.db, RowSeed::formula(20, "Margem")).await;
	web::router(Arc::new(Global {
		config: Config::default(),
		api,
	}))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
	let mut request = Request::builder().method(method).uri(uri);
	let body = match body {
		Some(json) => {
			request = request.header("Content-Type", "application/json");
			Body::from(json.to_string())
		}
		None => Body::empty(),
	};
	let response = router
		.clone()
		.oneshot(request.body(body).unwrap())
		.await
		.unwrap();
	let status = response.status();
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let json = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap()
	};
	(status, json)
}

#[tokio::test]
async fn test_record_listing() {
	let router = load_router("web-records").await;
	let (status, json) = send(&router, Method::GET, "/sql", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["count"], 1);
	assert_eq!(json["next"], Value::Null);
	assert_eq!(json["results"][0]["id"], 42);
	assert_eq!(json["results"][0]["titulo"], "Vendas");
	assert_eq!(json["results"][0]["reccreatedon"], "2025-01-01T10:00:00");

	let (status, json) = send(&router, Method::GET, "/sql?page=abc", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error"], "Invalid page.");
	let (status, _) = send(&router, Method::GET, "/fv?page=2", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, json) = send(&router, Method::GET, "/reports/10", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["codigo"], "R-10");
	let (status, _) = send(&router, Method::GET, "/reports/11", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, json) = send(&router, Method::GET, "/registros-modal?tabela=aud_fv", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json[0]["campo"], "Margem");
	let (status, _) = send(&router, Method::GET, "/registros-modal?tabela=AUD_XYZ", None).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dependency_endpoints() {
	let router = load_router("web-dependencies").await;
	let body = json!({
		"origem_tipo": "sql",
		"origem_id": "42",
		"destinos": [{"tipo": "report", "id": 10}, {"tipo": "fv", "id": "20"}],
		"prioridade": "Alta",
	});
	let (status, json) = send(&router, Method::POST, "/dependencias/criar-multiplas", Some(body)).await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(json["criadas"], 2);

	let (status, json) = send(&router, Method::GET, "/dependencias?prioridade=Alta", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["count"], 2);
	assert_eq!(json["results"][0]["origem_tabela"], "AUD_SQL");
	assert_eq!(json["results"][0]["origem_nome"], "Vendas");

	let body = json!({"origem_tipo": "sql", "origem_id": 42, "destinos": [], "prioridade": "Alta"});
	let (status, _) = send(&router, Method::POST, "/dependencias/criar-multiplas", Some(body)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let body = json!({"id_aud_report": 10, "id_aud_fv": 20});
	let (status, json) = send(&router, Method::POST, "/dependencias", Some(body)).await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(json["origem_label"], "REP: 10");
	let id = json["id"].as_i64().unwrap();

	let (status, _) = send(&router, Method::POST, "/dependencias", Some(json!({"id_aud_fv": 20}))).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let uri = format!("/dependencias/{}", id);
	let (status, _) = send(&router, Method::GET, &uri, None).await;
	assert_eq!(status, StatusCode::OK);
	let (status, _) = send(&router, Method::DELETE, &uri, None).await;
	assert_eq!(status, StatusCode::NO_CONTENT);
	let (status, _) = send(&router, Method::DELETE, &uri, None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, json) = send(&router, Method::GET, "/insights/dependencias", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["count"], 2);
	let (_, json) = send(&router, Method::GET, "/insights/prioridades", None).await;
	assert_eq!(json["Alta"], 3);
	assert_eq!(json["total"], 3);
}

#[tokio::test]
async fn test_notification_endpoints() {
	let router = load_router("web-notifications").await;
	let (status, json) = send(&router, Method::GET, "/notificacoes?limit=2", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json.as_array().map(|a| a.len()), Some(2));
	// Undated records count as changed just now
	assert_eq!(json[0]["id"], "report-10");
	assert_eq!(json[1]["id"], "fv-20");

	let (status, json) = send(&router, Method::POST, "/notificacoes/sql-42/lida", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["success"], true);
	assert_eq!(json["tabela"], "AUD_SQL");

	let (status, json) = send(&router, Method::GET, "/notificacoes?somente_nao_lidas=TRUE", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json.as_array().map(|a| a.len()), Some(2));

	for (uid, expected) in [
		("xyz", StatusCode::BAD_REQUEST),
		("zzz-9", StatusCode::BAD_REQUEST),
		("sql-999", StatusCode::NOT_FOUND),
	] {
		let uri = format!("/notificacoes/{}/lida", uid);
		let (status, json) = send(&router, Method::POST, &uri, None).await;
		assert_eq!(status, expected, "{}", uid);
		assert!(json["error"].is_string());
	}
}

#[tokio::test]
async fn test_history_endpoints() {
	let router = load_router("web-history").await;
	let (status, json) = send(&router, Method::GET, "/historico-alteracoes?page_size=2", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["count"], 3);
	assert_eq!(json["next"], "?page=2&page_size=2");
	assert_eq!(json["results"][0]["tabela"], "AUD_SQL");

	let (status, _) = send(&router, Method::GET, "/historico-alteracoes?page=0", None).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	let (status, _) = send(&router, Method::GET, "/historico-alteracoes?tabela=AUD_XYZ", None).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, json) = send(&router, Method::GET, "/comparar-registros?tabela=aud_sql&id=42", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["registro_atual"]["titulo"], "Vendas");
	assert_eq!(json["registro_anterior"], Value::Null);
	let (status, _) = send(&router, Method::GET, "/comparar-registros?tabela=AUD_SQL", None).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	let (status, _) = send(&router, Method::GET, "/comparar-registros?tabela=AUD_SQL&id=7", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let body = json!({"tabela": "AUD_FV", "id": 20, "texto": "Reviewed"});
	let (status, json) = send(&router, Method::POST, "/adicionar-observacao-registro", Some(body)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["success"], true);
	assert_eq!(json["id"], 20);

	let body = json!({"tabela": "AUD_FV", "id": 21, "texto": "Reviewed"});
	let (status, _) = send(&router, Method::POST, "/adicionar-observacao-registro", Some(body)).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	let body = json!({"tabela": "AUD_FV", "texto": "Reviewed"});
	let (status, _) = send(&router, Method::POST, "/adicionar-observacao-registro", Some(body)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
}
