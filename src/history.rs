//! Reconstructs the change history of audited records from their duplicate
//! rows.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::*;
use serde::*;

use crate::{
	common::*,
	db,
	record::{AuditRow, RecordDetail, RecordKind},
	store::AuditStore,
};


const SNAPSHOT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Restricts the aggregated history to a date range and/or a single table.
#[derive(Clone, Debug, Default)]
pub struct HistoryFilter {
	pub start: Option<NaiveDateTime>,
	pub end: Option<NaiveDateTime>,
	pub table: Option<RecordKind>,
}

/// An entry of the aggregated change history.
#[derive(Debug, Serialize)]
pub struct HistoryItem {
	pub tabela: &'static str,
	pub id: i64,
	#[serde(flatten)]
	pub fields: HistoryFields,
	pub reccreatedby: String,
	pub prioridade: Option<String>,
	pub observacao: Option<String>,
	#[serde(serialize_with = "serialize_timestamp")]
	pub data_criacao: Option<NaiveDateTime>,
	#[serde(serialize_with = "serialize_timestamp")]
	pub data_modificacao: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HistoryFields {
	Sql { codsentenca: i64, titulo: String },
	Report { descricao: String },
	Formula { nome: String },
}

/// The state of a record at one point in its history.
#[derive(Debug, Serialize)]
pub struct Snapshot {
	pub id: i64,
	#[serde(flatten)]
	pub fields: SnapshotFields,
	pub reccreatedby: Option<String>,
	#[serde(serialize_with = "serialize_timestamp")]
	pub reccreatedon: Option<NaiveDateTime>,
	#[serde(serialize_with = "serialize_timestamp")]
	pub recmodifiedon: Option<NaiveDateTime>,
	pub prioridade: Option<String>,
	pub observacao: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SnapshotFields {
	Sql {
		codsentenca: i64,
		titulo: Option<String>,
		sentenca: Option<String>,
		aplicacao: Option<String>,
		tamanho: Option<i32>,
	},
	Report {
		codigo: Option<String>,
		descricao: Option<String>,
		codaplicacao: Option<i32>,
	},
	Formula {
		nome: Option<String>,
		descricao: Option<String>,
		idcategoria: Option<i32>,
		ativo: bool,
	},
}

/// A version of a record next to the one that preceded it.
#[derive(Debug, Serialize)]
pub struct Comparison {
	pub tabela: &'static str,
	pub registro_atual: Snapshot,
	pub registro_anterior: Option<Snapshot>,
}


/// Sorts the rows of a record from the most recent version to the oldest.
///
/// Rows are ordered on their effective timestamp, then on their creation
/// time, then on insertion order. Rows without any timestamp come last.
pub fn order_versions(rows: &mut [AuditRow]) {
	rows.sort_by(|a, b| {
		b.effective_timestamp()
			.cmp(&a.effective_timestamp())
			.then_with(|| b.created_on.cmp(&a.created_on))
			.then_with(|| b.row_id.cmp(&a.row_id))
	});
}

/// Parses the timestamp that identifies a snapshot.
///
/// Accepts ISO-8601 input with or without a `T` separator, fractional seconds
/// or a `+hh:mm` offset; everything beyond whole seconds is discarded.
pub fn parse_snapshot_timestamp(input: &str) -> Option<NaiveDateTime> {
	let spaced = input.replace('T', " ");

	// Drop every fraction: a dot followed by digits
	let mut cleaned = String::with_capacity(spaced.len());
	let mut chars = spaced.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '.' && chars.peek().map(|n| n.is_ascii_digit()).unwrap_or(false) {
			while chars.peek().map(|n| n.is_ascii_digit()).unwrap_or(false) {
				chars.next();
			}
		} else {
			cleaned.push(c);
		}
	}

	let without_offset = strip_offset(&cleaned);
	let trimmed = without_offset.trim();
	let truncated: String = trimmed.chars().take(19).collect();
	NaiveDateTime::parse_from_str(&truncated, SNAPSHOT_FORMAT).ok()
}

fn strip_offset(input: &str) -> &str {
	let bytes = input.as_bytes();
	if bytes.len() < 6 {
		return input;
	}
	let tail = &bytes[bytes.len() - 6..];
	let is_offset = (tail[0] == b'+' || tail[0] == b'-')
		&& tail[1].is_ascii_digit()
		&& tail[2].is_ascii_digit()
		&& tail[3] == b':'
		&& tail[4].is_ascii_digit()
		&& tail[5].is_ascii_digit();
	if is_offset {
		&input[..input.len() - 6]
	} else {
		input
	}
}

/// Finds the index of the version identified by the given timestamp.
///
/// Falls back to the most recent version when no timestamp is given, when it
/// can't be parsed, or when no version matches it.
pub fn select_snapshot(versions: &[AuditRow], snapshot: Option<&str>) -> usize {
	let wanted = match snapshot.filter(|s| !s.is_empty()) {
		None => return 0,
		Some(s) => match parse_snapshot_timestamp(s) {
			Some(t) => t,
			None => {
				debug!("Ignoring unparsable snapshot timestamp {:?}", s);
				return 0;
			}
		},
	};

	versions
		.iter()
		.position(|row| {
			row.effective_timestamp()
				.and_then(|t| t.with_nanosecond(0))
				.map(|t| t == wanted)
				.unwrap_or(false)
		})
		.unwrap_or(0)
}

/// Loads the requested version of a record together with the one before it.
///
/// Returns `None` when the record has no rows at all.
pub async fn compare(
	store: &impl AuditStore, kind: RecordKind, key: i64, snapshot: Option<&str>,
) -> db::Result<Option<Comparison>> {
	let mut versions = store.load_versions(kind, key).await?;
	if versions.is_empty() {
		return Ok(None);
	}

	let index = select_snapshot(&versions, snapshot);
	let previous = if index + 1 < versions.len() {
		Some(Snapshot::from(versions.remove(index + 1)))
	} else {
		None
	};
	let current = Snapshot::from(versions.remove(index));
	Ok(Some(Comparison {
		tabela: kind.table(),
		registro_atual: current,
		registro_anterior: previous,
	}))
}

/// Builds one page of the change history across the three tables.
pub async fn load_history(
	store: &impl AuditStore, filter: &HistoryFilter, page: &PageRequest,
) -> db::Result<Page<HistoryItem>> {
	let mut items = Vec::new();
	for kind in RecordKind::ALL {
		if filter.table.map(|t| t != kind).unwrap_or(false) {
			continue;
		}

		let rows = store
			.load_rows_between(kind, filter.start, filter.end)
			.await?;
		items.extend(
			rows.into_iter()
				.filter(|row| filter.contains(row.effective_timestamp()))
				.map(HistoryItem::from),
		);
	}

	// Stable, so rows with equal or missing creation dates keep their order
	items.sort_by(|a, b| match (&a.data_criacao, &b.data_criacao) {
		(Some(x), Some(y)) => y.cmp(x),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	});

	Ok(Page::slice(page.number(), page.page_size, items))
}


impl HistoryFilter {
	/// Parses the `YYYY-MM-DD` bounds of the history listing. Bounds that can't
	/// be parsed are ignored, and the end bound covers its whole day.
	pub fn parse(start: Option<&str>, end: Option<&str>, table: Option<RecordKind>) -> Self {
		let parse_date = |s: &str| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok();
		Self {
			start: start
				.and_then(parse_date)
				.map(|d| d.and_time(NaiveTime::MIN)),
			end: end
				.and_then(parse_date)
				.and_then(|d| d.and_hms_opt(23, 59, 59)),
			table,
		}
	}

	/// Whether a row with the given reference date falls inside the range.
	/// Undated rows are not filtered here.
	pub fn contains(&self, reference: Option<NaiveDateTime>) -> bool {
		let reference = match reference {
			None => return true,
			Some(r) => r,
		};
		if let Some(start) = self.start {
			if reference < start {
				return false;
			}
		}
		if let Some(end) = self.end {
			if reference > end {
				return false;
			}
		}
		true
	}
}

impl From<AuditRow> for HistoryItem {
	fn from(row: AuditRow) -> Self {
		let or_na = |s: Option<String>| s.filter(|s| !s.is_empty()).unwrap_or("N/A".to_string());
		let reccreatedby = row.responsible().unwrap_or("N/A").to_string();
		let prioridade = row.priority().map(|s| s.to_string());
		let observacao = row.observation().map(|s| s.to_string());
		let fields = match row.detail {
			RecordDetail::Sql {
				codsentenca,
				titulo,
				..
			} => HistoryFields::Sql {
				codsentenca,
				titulo: or_na(titulo),
			},
			RecordDetail::Report { descricao, .. } => HistoryFields::Report {
				descricao: or_na(descricao),
			},
			RecordDetail::Formula { nome, .. } => HistoryFields::Formula { nome: or_na(nome) },
		};

		Self {
			tabela: row.kind.table(),
			id: row.key,
			fields,
			reccreatedby,
			prioridade,
			observacao,
			data_criacao: row.created_on,
			data_modificacao: row.modified_on,
		}
	}
}

impl From<AuditRow> for Snapshot {
	fn from(row: AuditRow) -> Self {
		let reccreatedby = row.responsible().map(|s| s.to_string());
		let fields = match row.detail {
			RecordDetail::Sql {
				codsentenca,
				titulo,
				sentenca,
				aplicacao,
				tamanho,
				..
			} => SnapshotFields::Sql {
				codsentenca,
				titulo,
				sentenca,
				aplicacao,
				tamanho,
			},
			RecordDetail::Report {
				codigo,
				descricao,
				codaplicacao,
				..
			} => SnapshotFields::Report {
				codigo,
				descricao,
				codaplicacao,
			},
			RecordDetail::Formula {
				nome,
				descricao,
				idcategoria,
				ativo,
				..
			} => SnapshotFields::Formula {
				nome,
				descricao,
				idcategoria,
				ativo,
			},
		};

		Self {
			id: row.key,
			fields,
			reccreatedby,
			reccreatedon: row.created_on,
			recmodifiedon: row.modified_on,
			prioridade: row.priority,
			observacao: row.observation,
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::test::{self, RowSeed};

	#[test]
	fn test_parse_snapshot_timestamp() {
		let expected = test::timestamp("2025-10-09 13:39:33");
		for input in [
			"2025-10-09T13:39:33",
			"2025-10-09 13:39:33",
			"2025-10-09T13:39:33.000",
			"2025-10-09T13:39:33.123456+00:00",
			"2025-10-09 13:39:33-03:00",
			" 2025-10-09T13:39:33Z",
		] {
			assert_eq!(parse_snapshot_timestamp(input), Some(expected), "{}", input);
		}
		assert_eq!(parse_snapshot_timestamp("yesterday"), None);
		assert_eq!(parse_snapshot_timestamp("2025-10-09"), None);
	}

	#[test]
	fn test_history_filter() {
		let filter = HistoryFilter::parse(Some("2025-01-10"), Some("2025-01-20"), None);
		assert!(filter.contains(Some(test::timestamp("2025-01-20 23:59:59"))));
		assert!(filter.contains(Some(test::timestamp("2025-01-10 00:00:00"))));
		assert!(!filter.contains(Some(test::timestamp("2025-01-21 00:00:00"))));
		assert!(!filter.contains(Some(test::timestamp("2025-01-09 23:59:59"))));
		assert!(filter.contains(None));

		let filter = HistoryFilter::parse(Some("10/01/2025"), Some(""), None);
		assert!(filter.start.is_none());
		assert!(filter.end.is_none());
	}

	#[tokio::test]
	async fn test_undated_rows_sort_last() {
		let db = test::load_database("history-undated").await;
		test::insert_row(&db, RowSeed::report(1, "R1")).await;
		test::insert_row(&db, RowSeed::report(2, "R2").at("2025-01-01 08:00:00", None)).await;
		test::insert_row(&db, RowSeed::sql(3, "S3").at("2024-01-01 08:00:00", None)).await;

		let page = load_history(
			&db,
			&HistoryFilter::default(),
			&PageRequest::parse_strict(None, None, 20).unwrap(),
		)
		.await
		.unwrap();
		let ids: Vec<i64> = page.results.iter().map(|i| i.id).collect();
		assert_eq!(ids, vec![2, 3, 1]);
		assert_eq!(page.count, 3);
		assert!(page.next.is_none());
	}
}
