//! The operations exposed to clients, on top of an injected database handle.

use log::*;
use serde::*;
use thiserror::Error;

use crate::{
	common::*,
	db::{self, Database},
	dependency::{self, BulkLinkDraft, BulkLinkOutcome, LinkFilter, LinkView},
	history::{self, Comparison, HistoryFilter, HistoryItem},
	insight::{self, Count, PriorityBreakdown},
	notification::{self, Notification, ReadReceipt},
	record::{AuditRow, Priority, RecordDetail, RecordKind},
	store::{AuditStore, LinkRefs, LinkStore, ObservationStore},
	trace::{self, Traced},
};


#[derive(Clone)]
pub struct Api {
	pub db: Database,
}

#[derive(Debug, Error)]
pub enum Error {
	/// The request is malformed or refers to something that can't exist.
	#[error("{0}")]
	Validation(String),
	#[error("{0}")]
	NotFound(String),
	#[error("database error: {0}")]
	Database(db::Error),
}

pub type Result<T> = trace::Result<T, self::Error>;

/// An observation to attach to a record, as given by the client.
#[derive(Clone, Debug, Default)]
pub struct ObservationDraft {
	pub table: Option<String>,
	pub key: Option<i64>,
	pub text: Option<String>,
	pub priority: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ObservationOutcome {
	pub success: bool,
	pub message: String,
	pub tabela: &'static str,
	pub id: i64,
}

/// A record as offered in the link picker.
#[derive(Debug, Serialize)]
pub struct ModalEntry {
	pub id: i64,
	pub user: String,
	pub tabela: &'static str,
	pub campo: String,
	#[serde(flatten)]
	pub fields: ModalFields,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ModalFields {
	Sql {
		codigo: i64,
		titulo: Option<String>,
		sentenca: Option<String>,
	},
	Report {
		codigo: Option<String>,
		descricao: Option<String>,
	},
	Formula {
		nome: Option<String>,
		descricao: Option<String>,
	},
}


fn invalid_page<T>() -> Result<T> { trace::err(Error::NotFound("Invalid page.".to_string())) }

fn record_not_found<T>(kind: RecordKind, key: i64) -> Result<T> {
	trace::err(Error::NotFound(format!(
		"record not found in table {} with id {}",
		kind.table(),
		key
	)))
}


impl Api {
	pub fn new(db: Database) -> Self { Self { db } }

	/// One page of a table, sorted on the record labels.
	pub async fn load_records(&self, kind: RecordKind, page: &PageRequest) -> Result<Page<AuditRow>> {
		let count = self.db.count_rows(kind).await?;
		let number = match page.resolve(count) {
			Ok(n) => n,
			Err(_) => return invalid_page(),
		};
		let rows = self
			.db
			.load_page(kind, page.offset(number), page.page_size)
			.await?;
		Ok(Page::new(number, page.page_size, count, rows))
	}

	/// The current version of a record.
	pub async fn load_record(&self, kind: RecordKind, key: i64) -> Result<AuditRow> {
		match self.db.load_current(kind, key).await? {
			Some(row) => Ok(row),
			None => record_not_found(kind, key),
		}
	}

	pub async fn load_modal_entries(&self, kind: RecordKind) -> Result<Vec<ModalEntry>> {
		let rows = self.db.load_rows_by_label(kind).await?;
		Ok(rows.into_iter().map(ModalEntry::from).collect())
	}

	pub async fn load_links(&self, filter: &LinkFilter, page: &PageRequest) -> Result<Page<LinkView>> {
		let links = dependency::list_links(&self.db, filter).await?;
		let number = match page.resolve(links.len() as u64) {
			Ok(n) => n,
			Err(_) => return invalid_page(),
		};
		Ok(Page::slice(number, page.page_size, links))
	}

	pub async fn load_link(&self, id: i64) -> Result<LinkView> {
		dependency::load_link(&self.db, id).await
	}

	pub async fn create_link(&self, refs: &LinkRefs, created_by: Option<i64>) -> Result<LinkView> {
		dependency::create_link(&self.db, refs, created_by).await
	}

	pub async fn create_links(
		&self, draft: &BulkLinkDraft, created_by: Option<i64>,
	) -> Result<BulkLinkOutcome> {
		dependency::create_multiple(&self.db, draft, created_by).await
	}

	pub async fn delete_link(&self, id: i64) -> Result<()> {
		if !self.db.delete_link(id).await? {
			return trace::err(Error::NotFound(format!("dependency {} not found", id)));
		}
		info!("Deleted dependency {}", id);
		Ok(())
	}

	pub async fn load_history(
		&self, filter: &HistoryFilter, page: &PageRequest,
	) -> Result<Page<HistoryItem>> {
		Ok(history::load_history(&self.db, filter, page).await?)
	}

	pub async fn compare(
		&self, kind: RecordKind, key: i64, snapshot: Option<&str>,
	) -> Result<Comparison> {
		match history::compare(&self.db, kind, key, snapshot).await? {
			Some(c) => Ok(c),
			None => record_not_found(kind, key),
		}
	}

	/// Sets the observation of a record, and its priority when one is given.
	/// The text is also kept as a separate observation entry.
	pub async fn add_observation(
		&self, draft: &ObservationDraft, created_by: Option<i64>,
	) -> Result<ObservationOutcome> {
		let (table, key, text) = match (
			draft.table.as_deref().filter(|t| !t.is_empty()),
			draft.key,
			draft.text.as_deref().filter(|t| !t.is_empty()),
		) {
			(Some(table), Some(key), Some(text)) => (table, key, text),
			_ =>
				return trace::err(Error::Validation(
					"required fields: tabela, id, texto".to_string(),
				)),
		};
		let kind = match RecordKind::from_table(table) {
			Ok(k) => k,
			Err(_) =>
				return trace::err(Error::Validation(
					"invalid table, use one of: AUD_SQL, AUD_REPORT or AUD_FV".to_string(),
				)),
		};
		let priority = draft.priority.as_deref().filter(|p| !p.is_empty());
		if let Some(p) = priority {
			if p.parse::<Priority>().is_err() {
				return trace::err(Error::Validation(
					"invalid priority, use one of: Alta, Média or Baixa".to_string(),
				));
			}
		}

		let tx = self.db.transaction().await?;
		if tx.update_observation(kind, key, text, priority).await? == 0 {
			tx.rollback().await?;
			return record_not_found(kind, key);
		}
		tx.insert_observation(text, created_by, current_timestamp())
			.await?;
		tx.commit().await?;

		debug!("Added observation to {} record {}", kind.table(), key);
		Ok(ObservationOutcome {
			success: true,
			message: "Observation added successfully".to_string(),
			tabela: kind.table(),
			id: key,
		})
	}

	pub async fn load_notifications(&self, limit: usize, unread_only: bool) -> Result<Vec<Notification>> {
		Ok(notification::load_notifications(&self.db, limit, unread_only).await?)
	}

	pub async fn mark_notification_read(&self, uid: &str) -> Result<ReadReceipt> {
		notification::mark_read(&self.db, uid).await
	}

	pub async fn count_records(&self, kind: RecordKind) -> Result<Count> {
		Ok(insight::count_records(&self.db, kind).await?)
	}

	pub async fn count_links(&self) -> Result<Count> { Ok(insight::count_links(&self.db).await?) }

	pub async fn count_priorities(&self) -> Result<PriorityBreakdown> {
		Ok(insight::count_priorities(&self.db).await?)
	}
}

impl From<Traced<db::Error>> for Traced<Error> {
	fn from(other: Traced<db::Error>) -> Self { other.map(Error::Database) }
}

impl From<AuditRow> for ModalEntry {
	fn from(row: AuditRow) -> Self {
		let user = row
			.created_by
			.clone()
			.filter(|u| !u.is_empty())
			.unwrap_or("N/A".to_string());
		let campo = row.name_or_key();
		let fields = match row.detail {
			RecordDetail::Sql {
				codsentenca,
				titulo,
				sentenca,
				..
			} => ModalFields::Sql {
				codigo: codsentenca,
				titulo,
				sentenca,
			},
			RecordDetail::Report {
				codigo, descricao, ..
			} => ModalFields::Report { codigo, descricao },
			RecordDetail::Formula { nome, descricao, .. } => ModalFields::Formula { nome, descricao },
		};

		Self {
			id: row.key,
			user,
			tabela: row.kind.table(),
			campo,
			fields,
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::{test, test::RowSeed};

	async fn load_api(filename: &str) -> Api { Api::new(test::load_database(filename).await) }

	#[tokio::test]
	async fn test_record_pages() {
		let api = load_api("api-pages").await;
		for key in 1..=5 {
			test::insert_row(&api.db, RowSeed::formula(key, &format!("formula {}", key))).await;
		}

		let request = PageRequest::parse_listing(Some("2"), Some("2"), 20, 100).unwrap();
		let page = api.load_records(RecordKind::Formula, &request).await.unwrap();
		assert_eq!(page.count, 5);
		assert_eq!(
			page.results.iter().map(|r| r.key).collect::<Vec<_>>(),
			vec![3, 4]
		);

		let request = PageRequest::parse_listing(Some("last"), Some("2"), 20, 100).unwrap();
		let page = api.load_records(RecordKind::Formula, &request).await.unwrap();
		assert_eq!(page.results.len(), 1);
		assert_eq!(page.next, None);

		let request = PageRequest::parse_listing(Some("4"), Some("2"), 20, 100).unwrap();
		let error = api.load_records(RecordKind::Formula, &request).await.unwrap_err();
		assert!(matches!(*error, Error::NotFound(_)));

		let request = PageRequest::parse_listing(None, None, 20, 100).unwrap();
		let page = api.load_records(RecordKind::Sql, &request).await.unwrap();
		assert_eq!(page.count, 0);
	}

	#[tokio::test]
	async fn test_add_observation() {
		let api = load_api("api-observation").await;
		test::insert_row(&api.db, RowSeed::report(10, "R-10")).await;

		let mut draft = ObservationDraft {
			table: Some("aud_report".to_string()),
			key: Some(10),
			text: Some("checked".to_string()),
			priority: Some("Alta".to_string()),
		};
		let outcome = api.add_observation(&draft, Some(1)).await.unwrap();
		assert_eq!(outcome.tabela, "AUD_REPORT");
		let row = api.load_record(RecordKind::Report, 10).await.unwrap();
		assert_eq!(row.observation(), Some("checked"));
		assert_eq!(row.priority(), Some("Alta"));

		draft.priority = Some("urgent".to_string());
		let error = api.add_observation(&draft, None).await.unwrap_err();
		assert!(matches!(*error, Error::Validation(_)));

		draft.priority = None;
		draft.key = Some(11);
		let error = api.add_observation(&draft, None).await.unwrap_err();
		assert!(matches!(*error, Error::NotFound(_)));

		draft.text = None;
		let error = api.add_observation(&draft, None).await.unwrap_err();
		assert!(matches!(*error, Error::Validation(_)));
	}

	#[tokio::test]
	async fn test_modal_entries_are_sorted_on_label() {
		let api = load_api("api-modal").await;
		test::insert_row(&api.db, RowSeed::sql(2, "Zeta")).await;
		test::insert_row(&api.db, RowSeed::sql(1, "Alpha")).await;

		let entries = api.load_modal_entries(RecordKind::Sql).await.unwrap();
		assert_eq!(
			entries.iter().map(|e| e.campo.as_str()).collect::<Vec<_>>(),
			vec!["Alpha", "Zeta"]
		);
		assert_eq!(entries[0].tabela, "AUD_SQL");
	}
}
