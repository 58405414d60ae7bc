use audtrackd::{
	api::{Api, Error},
	record::RecordKind,
	store::AuditStore,
	test::{self, RowSeed},
};


#[ctor::ctor]
fn initialize() { env_logger::init(); }

async fn load_api(filename: &str) -> Api {
	let api = Api::new(test::load_database(filename).await);
	test::insert_row(
		&api.db,
		RowSeed::sql(42, "Vendas")
			.at("2025-01-01 10:00:00", None)
			.by("ana", None),
	)
	.await;
	test::insert_row(
		&api.db,
		RowSeed::sql(42, "Vendas v2")
			.at("2025-01-01 10:00:00", Some("2025-03-01 10:00:00"))
			.by("ana", Some("bruno"))
			.priority("ALTA")
			.observation("Checked by the finance team"),
	)
	.await;
	test::insert_row(
		&api.db,
		RowSeed::report(7, "")
			.at("2025-02-01 10:00:00", None)
			.read(),
	)
	.await;
	test::insert_row(
		&api.db,
		RowSeed::formula(3, "Margem")
			.at("2025-01-15 10:00:00", None)
			.priority("urgente"),
	)
	.await;
	api
}

#[tokio::test]
async fn test_one_notification_per_record() {
	let api = load_api("notifications-list").await;
	let notifications = api.load_notifications(120, false).await.unwrap();
	let ids: Vec<_> = notifications.iter().map(|n| n.id.as_str()).collect();
	assert_eq!(ids, vec!["sql-42", "report-7", "fv-3"]);

	let sql = &notifications[0];
	assert_eq!(sql.registro_id, 42);
	assert_eq!(sql.tabela, "AUD_SQL");
	assert_eq!(sql.titulo, "Alteration in SQL: Vendas v2");
	assert_eq!(
		sql.descricao,
		"Record modified in table AUD_SQL - Checked by the finance team"
	);
	assert_eq!(sql.prioridade, "Alta");
	assert_eq!(sql.responsavel, "bruno");
	assert_eq!(sql.origem, "SQL");
	assert_eq!(sql.observacao.as_deref(), Some("Checked by the finance team"));
	assert!(!sql.lida);

	let report = &notifications[1];
	assert_eq!(report.titulo, "Alteration in REPORT: Report 7");
	assert_eq!(report.descricao, "Record created in table AUD_REPORT");
	assert_eq!(report.prioridade, "Baixa");
	assert_eq!(report.responsavel, "System");
	assert_eq!(report.observacao, None);
	assert!(report.lida);

	assert_eq!(notifications[2].prioridade, "Baixa");

	let limited = api.load_notifications(1, false).await.unwrap();
	assert_eq!(limited.len(), 1);
	assert_eq!(limited[0].id, "sql-42");

	let unread = api.load_notifications(120, true).await.unwrap();
	assert_eq!(
		unread.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
		vec!["sql-42", "fv-3"]
	);
}

#[tokio::test]
async fn test_mark_read() {
	let api = load_api("notifications-read").await;
	let receipt = api.mark_notification_read("sql-42").await.unwrap();
	assert!(receipt.success);
	assert_eq!(receipt.uid, "sql-42");
	assert_eq!(receipt.registro_id, 42);
	assert_eq!(receipt.tabela, "AUD_SQL");
	let row = api.db.load_current(RecordKind::Sql, 42).await.unwrap().unwrap();
	assert!(row.is_read());

	let receipt = api.mark_notification_read("FV-3").await.unwrap();
	assert_eq!(receipt.tabela, "AUD_FV");
}

#[tokio::test]
async fn test_mark_read_errors() {
	let api = load_api("notifications-errors").await;
	for uid in ["xyz", "zzz-9", "sql-abc", "-5"] {
		let error = api.mark_notification_read(uid).await.unwrap_err();
		assert!(matches!(*error, Error::Validation(_)), "{}", uid);
	}
	let error = api.mark_notification_read("sql-999").await.unwrap_err();
	assert!(matches!(*error, Error::NotFound(_)));
}
