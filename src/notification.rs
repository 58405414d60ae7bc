//! Presents the current state of every audited record as a notification.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use log::*;
use serde::*;

use crate::{
	api::{self, Error},
	common::*,
	db,
	record::{AuditRow, Priority, RecordKind},
	store::AuditStore,
	trace,
};


/// Observations are cut to this length inside a notification's description.
pub const SUMMARY_LENGTH: usize = 100;
/// Observations are cut to this length when shown on their own.
pub const OBSERVATION_LENGTH: usize = 280;

#[derive(Debug, Serialize)]
pub struct Notification {
	/// `<kind>-<key>`, e.g. `sql-42`.
	pub id: String,
	pub registro_id: i64,
	pub tabela: &'static str,
	pub titulo: String,
	pub descricao: String,
	pub prioridade: &'static str,
	pub lida: bool,
	#[serde(serialize_with = "serialize_datetime")]
	pub data_hora: NaiveDateTime,
	pub responsavel: String,
	pub origem: &'static str,
	pub observacao: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ReadReceipt {
	pub success: bool,
	pub uid: String,
	pub registro_id: i64,
	pub tabela: &'static str,
}


/// Reads the requested number of notifications, clamped to `1..=max`.
pub fn sanitize_limit(raw: Option<&str>, default: usize, max: usize) -> usize {
	let requested = raw
		.and_then(|r| r.trim().parse::<i64>().ok())
		.unwrap_or(default as i64);
	requested.clamp(1, max.max(1) as i64) as usize
}

/// Cuts text down to `limit` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, limit: usize) -> String {
	let text = text.trim();
	if text.is_empty() {
		return "No description available.".to_string();
	}
	if text.chars().count() <= limit {
		return text.to_string();
	}
	let mut cut: String = text.chars().take(limit.saturating_sub(3)).collect();
	cut.push_str("...");
	cut
}

/// Splits a notification id into its kind tag and record key.
///
/// Returns `None` when there is no dash or the key is not an integer. The kind
/// itself is not checked here.
pub fn parse_uid(uid: &str) -> Option<(String, i64)> {
	let (kind, key) = uid.split_once('-')?;
	let key = key.trim().parse::<i64>().ok()?;
	Some((kind.to_lowercase(), key))
}

/// Loads the notifications of all records, the most recently changed first.
pub async fn load_notifications(
	store: &impl AuditStore, limit: usize, unread_only: bool,
) -> db::Result<Vec<Notification>> {
	let now = current_timestamp();
	let mut notifications = Vec::new();
	for kind in RecordKind::ALL {
		let mut seen = HashSet::new();
		// Rows come most recent first, so the first row of a key is its
		// current version
		for row in store.load_rows(kind).await? {
			if !seen.insert(row.key) {
				continue;
			}
			if unread_only && row.is_read() {
				continue;
			}
			notifications.push(Notification::new(&row, now));
		}
	}

	notifications.sort_by(|a, b| b.data_hora.cmp(&a.data_hora));
	notifications.truncate(limit);
	Ok(notifications)
}

/// Marks the record behind a notification id as read.
pub async fn mark_read(store: &impl AuditStore, uid: &str) -> api::Result<ReadReceipt> {
	let (tag, key) = match parse_uid(uid) {
		Some(p) => p,
		None =>
			return trace::err(Error::Validation(
				"invalid identifier, use the format <kind>-<id>".to_string(),
			)),
	};
	let kind = match RecordKind::from_tag(&tag) {
		Ok(k) => k,
		Err(_) =>
			return trace::err(Error::Validation(format!(
				"kind '{}' is not supported",
				tag
			))),
	};

	if store.mark_read(kind, key).await? == 0 {
		return trace::err(Error::NotFound(format!(
			"record {} not found in {}",
			key,
			kind.table()
		)));
	}
	debug!("Marked {} record {} as read", kind.table(), key);
	Ok(ReadReceipt {
		success: true,
		uid: uid.to_string(),
		registro_id: key,
		tabela: kind.table(),
	})
}


impl Notification {
	/// Undated records are presented as changed at `now`.
	pub fn new(row: &AuditRow, now: NaiveDateTime) -> Self {
		let kind = row.kind;
		let name = match row.name() {
			Some(n) => n.to_string(),
			None => match kind {
				RecordKind::Sql => format!("SQL {}", row.key),
				RecordKind::Report => format!("Report {}", row.key),
				RecordKind::Formula => format!("FV {}", row.key),
			},
		};
		let action = if row.modified_on.is_some() {
			"modified"
		} else {
			"created"
		};
		let mut descricao = format!("Record {} in table {}", action, kind.table());
		if let Some(observation) = row.observation() {
			descricao.push_str(" - ");
			descricao.push_str(&truncate(observation, SUMMARY_LENGTH));
		}

		Self {
			id: format!("{}-{}", kind.tag(), row.key),
			registro_id: row.key,
			tabela: kind.table(),
			titulo: format!("Alteration in {}: {}", kind.label(), name),
			descricao,
			prioridade: Priority::normalize(row.priority()).as_str(),
			lida: row.is_read(),
			data_hora: row
				.effective_timestamp()
				.unwrap_or(now),
			responsavel: row.responsible().unwrap_or("System").to_string(),
			origem: kind.label(),
			observacao: row
				.observation()
				.map(|o| truncate(o, OBSERVATION_LENGTH)),
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sanitize_limit() {
		assert_eq!(sanitize_limit(None, 120, 300), 120);
		assert_eq!(sanitize_limit(Some("5"), 120, 300), 5);
		assert_eq!(sanitize_limit(Some("1000"), 120, 300), 300);
		assert_eq!(sanitize_limit(Some("-4"), 120, 300), 1);
		assert_eq!(sanitize_limit(Some("0"), 120, 300), 1);
		assert_eq!(sanitize_limit(Some("many"), 120, 300), 120);
	}

	#[test]
	fn test_truncate() {
		assert_eq!(truncate("  short  ", 10), "short");
		assert_eq!(truncate("exactly10!", 10), "exactly10!");
		assert_eq!(truncate("this is too long", 10), "this is...");
		assert_eq!(truncate("ááááááááááá", 10), "ááááááá...");
		assert_eq!(truncate("   ", 10), "No description available.");
	}

	#[test]
	fn test_parse_uid() {
		assert_eq!(parse_uid("sql-42"), Some(("sql".to_string(), 42)));
		assert_eq!(parse_uid("FV-7"), Some(("fv".to_string(), 7)));
		assert_eq!(parse_uid("zzz-9"), Some(("zzz".to_string(), 9)));
		assert_eq!(parse_uid("report--3"), Some(("report".to_string(), -3)));
		assert_eq!(parse_uid("xyz"), None);
		assert_eq!(parse_uid("sql-abc"), None);
	}
}
