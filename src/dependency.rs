//! Links between records of different tables, and the propagation of
//! priorities along them.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use log::*;
use serde::*;

use crate::{
	api::{self, Error},
	common::*,
	db::{self, Database},
	entity::dependency,
	record::{max_priority, AuditRow, Priority, RecordKind},
	store::{AuditStore, LinkRefs, LinkStore},
	trace,
};


/// One side of a dependency link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
	pub kind: RecordKind,
	pub key: i64,
}

/// The derived roles of the two records of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roles {
	pub origin: Endpoint,
	pub destination: Endpoint,
}

#[derive(Clone, Debug, Default)]
pub struct LinkFilter {
	/// Keeps links that have an endpoint in this table.
	pub table: Option<RecordKind>,
	/// Keeps links whose resolved priority is exactly this value.
	pub priority: Option<String>,
	/// Keeps links without a resolved priority. Takes precedence over
	/// `priority`.
	pub without_priority: bool,
	/// Case-insensitive search through the endpoint ids and the creator id.
	pub search: Option<String>,
}

/// A link to create from one origin to several destinations.
#[derive(Clone, Debug, Default)]
pub struct BulkLinkDraft {
	pub origin_kind: Option<String>,
	pub origin_key: Option<i64>,
	/// Kind tag and key of every destination, as given.
	pub destinations: Vec<(Option<String>, Option<i64>)>,
	pub priority: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct BulkLinkOutcome {
	pub criadas: usize,
	pub ids: Vec<i64>,
}

/// A link as presented to clients, with both endpoints resolved.
#[derive(Debug, Serialize)]
pub struct LinkView {
	pub id: i64,
	pub id_aud_sql: Option<i64>,
	pub id_aud_report: Option<i64>,
	pub id_aud_fv: Option<i64>,
	#[serde(serialize_with = "serialize_timestamp")]
	pub data_criacao: Option<NaiveDateTime>,
	pub criado_por: Option<i64>,
	pub origem_tabela: Option<&'static str>,
	pub origem_id: Option<i64>,
	pub origem_nome: Option<String>,
	pub origem_label: String,
	pub destino_tabela: Option<&'static str>,
	pub destino_id: Option<i64>,
	pub destino_nome: Option<String>,
	pub destino_label: String,
	pub prioridade_nivel: Option<String>,
}

/// The current version of every record that links may point to.
#[derive(Default)]
pub struct RecordIndex {
	current: HashMap<Endpoint, AuditRow>,
}


impl LinkRefs {
	pub fn get(&self, kind: RecordKind) -> Option<i64> {
		match kind {
			RecordKind::Sql => self.sql,
			RecordKind::Report => self.report,
			RecordKind::Formula => self.formula,
		}
	}

	pub fn set(&mut self, endpoint: Endpoint) {
		let slot = match endpoint.kind {
			RecordKind::Sql => &mut self.sql,
			RecordKind::Report => &mut self.report,
			RecordKind::Formula => &mut self.formula,
		};
		*slot = Some(endpoint.key);
	}

	/// The populated references, ordered on precedence.
	pub fn endpoints(&self) -> Vec<Endpoint> {
		let mut endpoints: Vec<Endpoint> = RecordKind::ALL
			.into_iter()
			.filter_map(|kind| self.get(kind).map(|key| Endpoint { kind, key }))
			.collect();
		endpoints.sort_by_key(|e| e.kind.precedence());
		endpoints
	}

	/// Checks that exactly two references are populated. Each reference field
	/// belongs to a different table, so the two always differ in kind.
	pub fn validate(&self) -> api::Result<()> {
		let populated = self.endpoints().len();
		if populated != 2 {
			return trace::err(Error::Validation(format!(
				"exactly two of id_aud_sql, id_aud_report and id_aud_fv must be filled in, got {}",
				populated
			)));
		}
		Ok(())
	}

	/// Derives which record is the origin of the link: SQL sentences come
	/// before reports, which come before visual formulas.
	pub fn roles(&self) -> Option<Roles> {
		match self.endpoints().as_slice() {
			[origin, destination] => Some(Roles {
				origin: *origin,
				destination: *destination,
			}),
			_ => None,
		}
	}
}

impl From<&dependency::Model> for LinkRefs {
	fn from(model: &dependency::Model) -> Self {
		Self {
			sql: model.sql_id,
			report: model.report_id,
			formula: model.formula_id,
		}
	}
}

impl Endpoint {
	pub fn new(kind: RecordKind, key: i64) -> Self { Self { kind, key } }

	/// E.g. `REP: 10`.
	pub fn label(&self) -> String { format!("{}: {}", self.kind.short_label(), self.key) }
}

impl RecordIndex {
	/// Indexes the current version of every record of every table.
	pub async fn load_all(store: &impl AuditStore) -> db::Result<Self> {
		let mut index = Self::default();
		for kind in RecordKind::ALL {
			// Versions come most recent first, so the first row of a key wins
			for row in store.load_rows(kind).await? {
				index
					.current
					.entry(Endpoint::new(kind, row.key))
					.or_insert(row);
			}
		}
		Ok(index)
	}

	/// Indexes only the given records.
	pub async fn load_for(store: &impl AuditStore, endpoints: &[Endpoint]) -> db::Result<Self> {
		let mut index = Self::default();
		for endpoint in endpoints {
			if let Some(row) = store.load_current(endpoint.kind, endpoint.key).await? {
				index.current.insert(*endpoint, row);
			}
		}
		Ok(index)
	}

	pub fn get(&self, endpoint: &Endpoint) -> Option<&AuditRow> { self.current.get(endpoint) }

	/// The priority of the origin, or of the destination when the origin has
	/// none.
	pub fn resolve_priority(&self, roles: &Roles) -> Option<&str> {
		self.get(&roles.origin)
			.and_then(|r| r.priority())
			.or_else(|| self.get(&roles.destination).and_then(|r| r.priority()))
	}
}

impl LinkView {
	pub fn new(link: &dependency::Model, index: &RecordIndex) -> Self {
		let refs = LinkRefs::from(link);
		let roles = refs.roles();
		let origin = roles.map(|r| r.origin);
		let destination = roles.map(|r| r.destination);
		let name = |e: Option<Endpoint>| {
			e.and_then(|e| index.get(&e))
				.map(|row| row.name_or_key())
		};
		let label = |e: Option<Endpoint>| e.map(|e| e.label()).unwrap_or_else(|| "N/A".to_string());

		Self {
			id: link.id,
			id_aud_sql: link.sql_id,
			id_aud_report: link.report_id,
			id_aud_fv: link.formula_id,
			data_criacao: Some(link.created_on),
			criado_por: link.created_by,
			origem_tabela: origin.map(|e| e.kind.table()),
			origem_id: origin.map(|e| e.key),
			origem_nome: name(origin),
			origem_label: label(origin),
			destino_tabela: destination.map(|e| e.kind.table()),
			destino_id: destination.map(|e| e.key),
			destino_nome: name(destination),
			destino_label: label(destination),
			prioridade_nivel: roles
				.and_then(|r| index.resolve_priority(&r))
				.map(|p| p.to_string()),
		}
	}
}

impl LinkFilter {
	pub fn matches(&self, link: &dependency::Model, view: &LinkView) -> bool {
		if let Some(kind) = self.table {
			if LinkRefs::from(link).get(kind).is_none() {
				return false;
			}
		}

		// Priority filters only apply to links with both roles
		if (self.without_priority || self.priority.is_some()) && view.origem_tabela.is_none() {
			return false;
		}
		if self.without_priority {
			let blank = view
				.prioridade_nivel
				.as_deref()
				.map(|p| p.trim().is_empty())
				.unwrap_or(true);
			if !blank {
				return false;
			}
		} else if let Some(priority) = &self.priority {
			if view.prioridade_nivel.as_deref() != Some(priority.as_str()) {
				return false;
			}
		}

		if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
			let needle = search.to_lowercase();
			let found = [link.sql_id, link.report_id, link.formula_id, link.created_by]
				.into_iter()
				.flatten()
				.any(|id| id.to_string().contains(&needle));
			if !found {
				return false;
			}
		}
		true
	}
}

impl BulkLinkDraft {
	fn validate(&self) -> api::Result<(Endpoint, Option<Priority>)> {
		let kind = self
			.origin_kind
			.as_deref()
			.and_then(|t| RecordKind::from_tag(t).ok());
		let origin = match (kind, self.origin_key) {
			(Some(kind), Some(key)) => Endpoint::new(kind, key),
			_ => return trace::err(Error::Validation("invalid origin".to_string())),
		};
		if self.destinations.is_empty() {
			return trace::err(Error::Validation(
				"at least one destination is required".to_string(),
			));
		}

		let priority = match self.priority.as_deref().filter(|p| !p.is_empty()) {
			None => None,
			Some(p) => match p.parse::<Priority>() {
				Ok(p) => Some(p),
				Err(_) =>
					return trace::err(Error::Validation(
						"invalid priority, use one of: Alta, Média or Baixa".to_string(),
					)),
			},
		};
		Ok((origin, priority))
	}
}


/// Raises the priority of a record to the given one, unless it already has an
/// equal or higher priority. Missing records are left alone.
pub async fn propagate_priority(
	store: &impl AuditStore, endpoint: Endpoint, priority: Priority,
) -> db::Result<()> {
	let current = match store.load_current(endpoint.kind, endpoint.key).await? {
		None => return Ok(()),
		Some(r) => r,
	};

	let existing = current.priority();
	if let Some(merged) = max_priority(existing, Some(priority.as_str())) {
		if Some(merged) != existing {
			store
				.update_priority(endpoint.kind, endpoint.key, merged)
				.await?;
		}
	}
	Ok(())
}

/// Links one origin to several destinations in a single transaction, raising
/// the priority of every linked record when a priority is given.
///
/// Destinations of an unknown kind, of the origin's own kind, or without a
/// key are skipped. Failing to update a priority doesn't abort the batch.
pub async fn create_multiple(
	db: &Database, draft: &BulkLinkDraft, created_by: Option<i64>,
) -> api::Result<BulkLinkOutcome> {
	let (origin, priority) = draft.validate()?;

	let tx = db.transaction().await?;
	if let Some(p) = priority {
		if let Err(e) = propagate_priority(&tx, origin, p).await {
			warn!("Unable to update priority of origin {:?}: {}", origin, e);
		}
	}

	let created_on = current_timestamp();
	let mut ids = Vec::with_capacity(draft.destinations.len());
	let mut linked = Vec::with_capacity(draft.destinations.len());
	for (tag, key) in &draft.destinations {
		let kind = match tag.as_deref().map(RecordKind::from_tag) {
			Some(Ok(kind)) => kind,
			_ => {
				debug!("Skipping destination of unknown kind {:?}", tag);
				continue;
			}
		};
		if kind == origin.kind {
			debug!("Skipping destination of the origin's own kind {}", kind);
			continue;
		}
		let destination = match key {
			Some(key) => Endpoint::new(kind, *key),
			None => {
				debug!("Skipping {} destination without an id", kind);
				continue;
			}
		};

		let mut refs = LinkRefs::default();
		refs.set(origin);
		refs.set(destination);
		let link = tx.insert_link(&refs, created_by, created_on).await?;
		ids.push(link.id);
		linked.push(destination);
	}

	if let Some(p) = priority {
		for destination in &linked {
			if let Err(e) = propagate_priority(&tx, *destination, p).await {
				warn!(
					"Unable to update priority of destination {:?}: {}",
					destination, e
				);
			}
		}
	}
	tx.commit().await?;

	info!(
		"Created {} dependency links from {:?}",
		ids.len(),
		origin
	);
	Ok(BulkLinkOutcome {
		criadas: ids.len(),
		ids,
	})
}

/// Creates a single link between two records.
pub async fn create_link(
	db: &Database, refs: &LinkRefs, created_by: Option<i64>,
) -> api::Result<LinkView> {
	refs.validate()?;
	let link = db
		.insert_link(refs, created_by, current_timestamp())
		.await?;
	let index = RecordIndex::load_for(db, &refs.endpoints()).await?;
	Ok(LinkView::new(&link, &index))
}

pub async fn load_link(db: &Database, id: i64) -> api::Result<LinkView> {
	let link = match db.load_link(id).await? {
		Some(l) => l,
		None => return trace::err(Error::NotFound(format!("dependency {} not found", id))),
	};
	let index = RecordIndex::load_for(db, &LinkRefs::from(&link).endpoints()).await?;
	Ok(LinkView::new(&link, &index))
}

/// All links matching the filter, the most recently created first.
pub async fn list_links(db: &Database, filter: &LinkFilter) -> db::Result<Vec<LinkView>> {
	let links = db.load_links().await?;
	let index = RecordIndex::load_all(db).await?;
	Ok(links
		.iter()
		.filter_map(|link| {
			let view = LinkView::new(link, &index);
			if filter.matches(link, &view) {
				Some(view)
			} else {
				None
			}
		})
		.collect())
}


#[cfg(test)]
mod tests {
	use super::*;

	fn refs(sql: Option<i64>, report: Option<i64>, formula: Option<i64>) -> LinkRefs {
		LinkRefs {
			sql,
			report,
			formula,
		}
	}

	#[test]
	fn test_roles_follow_precedence() {
		let roles = refs(Some(1), Some(2), None).roles().unwrap();
		assert_eq!(roles.origin, Endpoint::new(RecordKind::Sql, 1));
		assert_eq!(roles.destination, Endpoint::new(RecordKind::Report, 2));

		let roles = refs(Some(1), None, Some(3)).roles().unwrap();
		assert_eq!(roles.origin.kind, RecordKind::Sql);
		assert_eq!(roles.destination.kind, RecordKind::Formula);

		let roles = refs(None, Some(2), Some(3)).roles().unwrap();
		assert_eq!(roles.origin.kind, RecordKind::Report);
		assert_eq!(roles.destination.kind, RecordKind::Formula);

		assert!(refs(Some(1), None, None).roles().is_none());
		assert!(refs(Some(1), Some(2), Some(3)).roles().is_none());
	}

	#[test]
	fn test_link_validation() {
		assert!(refs(Some(1), Some(2), None).validate().is_ok());
		// Zero is a valid key
		assert!(refs(Some(0), None, Some(0)).validate().is_ok());
		for invalid in [
			refs(None, None, None),
			refs(Some(1), None, None),
			refs(Some(1), Some(2), Some(3)),
		] {
			let error = invalid.validate().unwrap_err();
			assert!(matches!(*error, Error::Validation(_)));
		}
	}

	#[test]
	fn test_labels() {
		assert_eq!(Endpoint::new(RecordKind::Report, 10).label(), "REP: 10");
		assert_eq!(Endpoint::new(RecordKind::Formula, 20).label(), "FV: 20");
	}

	#[test]
	fn test_bulk_draft_validation() {
		let mut draft = BulkLinkDraft {
			origin_kind: Some("sql".to_string()),
			origin_key: Some(5),
			destinations: vec![(Some("report".to_string()), Some(10))],
			priority: Some("Média".to_string()),
		};
		let (origin, priority) = draft.validate().unwrap();
		assert_eq!(origin, Endpoint::new(RecordKind::Sql, 5));
		assert_eq!(priority, Some(Priority::Media));

		draft.priority = Some("Urgente".to_string());
		assert!(draft.validate().is_err());
		draft.priority = Some(String::new());
		assert_eq!(draft.validate().unwrap().1, None);

		draft.origin_kind = Some("xml".to_string());
		assert!(draft.validate().is_err());
		draft.origin_kind = Some("fv".to_string());
		draft.destinations.clear();
		assert!(draft.validate().is_err());
	}
}
