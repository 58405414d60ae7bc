//! Counters for the dashboard.

use std::collections::BTreeMap;

use serde::*;

use crate::{
	db,
	record::RecordKind,
	store::{AuditStore, LinkStore},
};


pub const WITHOUT_PRIORITY: &str = "Sem Prioridade";

#[derive(Debug, PartialEq, Serialize)]
pub struct Count {
	pub count: u64,
}

/// Row counts per priority value across all three tables.
///
/// Holds one entry per distinct non-empty value, an entry for rows without a
/// priority when there are any, and the grand `total`.
#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriorityBreakdown(pub BTreeMap<String, u64>);


pub async fn count_records(store: &impl AuditStore, kind: RecordKind) -> db::Result<Count> {
	Ok(Count {
		count: store.count_rows(kind).await?,
	})
}

pub async fn count_links(store: &impl LinkStore) -> db::Result<Count> {
	Ok(Count {
		count: store.count_links().await?,
	})
}

pub async fn count_priorities(store: &impl AuditStore) -> db::Result<PriorityBreakdown> {
	let mut counts = BTreeMap::new();
	let mut without = 0;
	for kind in RecordKind::ALL {
		for (priority, count) in store.count_priorities(kind).await? {
			match priority.filter(|p| !p.is_empty()) {
				Some(p) => *counts.entry(p).or_insert(0) += count,
				None => without += count,
			}
		}
	}

	if without > 0 {
		counts.insert(WITHOUT_PRIORITY.to_string(), without);
	}
	let total = counts.values().sum();
	counts.insert("total".to_string(), total);
	Ok(PriorityBreakdown(counts))
}
