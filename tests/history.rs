use audtrackd::{
	api::{Api, Error},
	common::PageRequest,
	history::{HistoryFields, HistoryFilter, SnapshotFields},
	record::RecordKind,
	test::{self, RowSeed},
};


#[ctor::ctor]
fn initialize() { env_logger::init(); }

/// A record with three versions: T1 (created), T2 and T3 (modified).
async fn load_versioned_api(filename: &str) -> Api {
	let api = Api::new(test::load_database(filename).await);
	let created = "2025-01-01 08:00:00";
	test::insert_row(&api.db, RowSeed::sql(42, "v1").at(created, None)).await;
	test::insert_row(
		&api.db,
		RowSeed::sql(42, "v3")
			.at(created, Some("2025-03-01 08:00:00"))
			.by("ana", Some("bruno")),
	)
	.await;
	test::insert_row(
		&api.db,
		RowSeed::sql(42, "v2").at(created, Some("2025-02-01 08:00:00")),
	)
	.await;
	api
}

fn title(fields: &SnapshotFields) -> Option<&str> {
	match fields {
		SnapshotFields::Sql { titulo, .. } => titulo.as_deref(),
		_ => None,
	}
}

#[tokio::test]
async fn test_compare_latest_by_default() {
	let api = load_versioned_api("history-latest").await;
	let comparison = api.compare(RecordKind::Sql, 42, None).await.unwrap();
	assert_eq!(comparison.tabela, "AUD_SQL");
	assert_eq!(title(&comparison.registro_atual.fields), Some("v3"));
	assert_eq!(comparison.registro_atual.reccreatedby.as_deref(), Some("bruno"));
	let previous = comparison.registro_anterior.unwrap();
	assert_eq!(title(&previous.fields), Some("v2"));
}

#[tokio::test]
async fn test_compare_selected_snapshot() {
	let api = load_versioned_api("history-snapshot").await;
	for snapshot in [
		"2025-02-01 08:00:00",
		"2025-02-01T08:00:00",
		"2025-02-01T08:00:00.123456",
		"2025-02-01T08:00:00-03:00",
	] {
		let comparison = api
			.compare(RecordKind::Sql, 42, Some(snapshot))
			.await
			.unwrap();
		assert_eq!(title(&comparison.registro_atual.fields), Some("v2"), "{}", snapshot);
		let previous = comparison.registro_anterior.unwrap();
		assert_eq!(title(&previous.fields), Some("v1"));
	}

	// The oldest version has nothing before it
	let comparison = api
		.compare(RecordKind::Sql, 42, Some("2025-01-01 08:00:00"))
		.await
		.unwrap();
	assert_eq!(title(&comparison.registro_atual.fields), Some("v1"));
	assert!(comparison.registro_anterior.is_none());
}

#[tokio::test]
async fn test_compare_falls_back_to_latest() {
	let api = load_versioned_api("history-fallback").await;
	for snapshot in ["yesterday", "2030-01-01 00:00:00", ""] {
		let comparison = api
			.compare(RecordKind::Sql, 42, Some(snapshot))
			.await
			.unwrap();
		assert_eq!(title(&comparison.registro_atual.fields), Some("v3"), "{}", snapshot);
	}

	let error = api.compare(RecordKind::Sql, 43, None).await.unwrap_err();
	assert!(matches!(*error, Error::NotFound(_)));
}

#[tokio::test]
async fn test_history_pages_are_disjoint() {
	let api = Api::new(test::load_database("history-pages").await);
	for day in 1..=7 {
		let created = format!("2025-01-{:02} 12:00:00", day);
		let seed = match day % 3 {
			0 => RowSeed::sql(day, &format!("s{}", day)),
			1 => RowSeed::report(day, &format!("r{}", day)),
			_ => RowSeed::formula(day, &format!("f{}", day)),
		};
		test::insert_row(&api.db, seed.at(&created, None)).await;
	}

	let filter = HistoryFilter::default();
	let request = |page: &str| PageRequest::parse_strict(Some(page), Some("3"), 20).unwrap();
	let everything = api
		.load_history(&filter, &PageRequest::parse_strict(None, Some("100"), 20).unwrap())
		.await
		.unwrap();
	assert_eq!(everything.count, 7);
	assert!(everything.next.is_none());

	let mut collected = Vec::new();
	for page in ["1", "2", "3"] {
		let result = api.load_history(&filter, &request(page)).await.unwrap();
		assert_eq!(result.count, 7);
		assert_eq!(result.next.is_none(), page == "3");
		collected.extend(result.results.into_iter().map(|i| (i.tabela, i.id)));
	}
	let expected: Vec<_> = everything.results.iter().map(|i| (i.tabela, i.id)).collect();
	assert_eq!(collected, expected);
	assert_eq!(expected.first(), Some(&("AUD_REPORT", 7)));
	assert_eq!(expected.last(), Some(&("AUD_REPORT", 1)));

	let beyond = api.load_history(&filter, &request("4")).await.unwrap();
	assert!(beyond.results.is_empty());
}

#[tokio::test]
async fn test_history_filters() {
	let api = Api::new(test::load_database("history-filters").await);
	test::insert_row(&api.db, RowSeed::sql(1, "").at("2025-01-05 10:00:00", None)).await;
	test::insert_row(&api.db, RowSeed::formula(2, "f").at("2025-01-20 10:00:00", None)).await;
	test::insert_row(
		&api.db,
		RowSeed::report(3, "r").at("2024-12-01 10:00:00", Some("2025-01-10 10:00:00")),
	)
	.await;

	let page = PageRequest::parse_strict(None, None, 20).unwrap();
	let filter = HistoryFilter::parse(Some("2025-01-01"), Some("2025-01-10"), None);
	let result = api.load_history(&filter, &page).await.unwrap();
	let ids: Vec<_> = result.results.iter().map(|i| i.id).collect();
	assert_eq!(ids, vec![1, 3]);
	match &result.results[0].fields {
		HistoryFields::Sql { titulo, .. } => assert_eq!(titulo, "N/A"),
		_ => panic!("expected an SQL entry"),
	}
	assert_eq!(result.results[0].reccreatedby, "N/A");

	let filter = HistoryFilter::parse(None, None, Some(RecordKind::Formula));
	let result = api.load_history(&filter, &page).await.unwrap();
	assert_eq!(result.count, 1);
	assert_eq!(result.results[0].tabela, "AUD_FV");
}
