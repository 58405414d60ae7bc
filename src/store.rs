//! Repository interfaces over the AUD tables, the dependency links and the
//! legacy observations.
//!
//! Every interface is implemented for anything that is a
//! [`PersistenceHandle`], so the same code runs on the database itself and
//! inside a transaction.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::{prelude::*, sea_query::*, *};

use crate::{
	db::{self, PersistenceHandle},
	entity::{aud_fv, aud_report, aud_sql, dependency, observation, AuditEntity},
	history::order_versions,
	record::{AuditRow, RecordKind},
};


/// Runs `$body` with `$entity` aliased to the entity of the given record kind.
macro_rules! with_entity {
	($kind:expr, $entity:ident => $body:expr) => {
		match $kind {
			RecordKind::Sql => {
				type $entity = aud_sql::Entity;
				$body
			}
			RecordKind::Report => {
				type $entity = aud_report::Entity;
				$body
			}
			RecordKind::Formula => {
				type $entity = aud_fv::Entity;
				$body
			}
		}
	};
}

/// The references of a new dependency link.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkRefs {
	pub sql: Option<i64>,
	pub report: Option<i64>,
	pub formula: Option<i64>,
}


async fn load_rows_where<E, C>(conn: &C, condition: Condition) -> db::Result<Vec<AuditRow>>
where
	E: AuditEntity,
	C: ConnectionTrait,
{
	let models = E::find().filter(condition).all(conn).await?;
	let mut rows: Vec<AuditRow> = models.into_iter().map(E::into_row).collect();
	order_versions(&mut rows);
	Ok(rows)
}

async fn load_rows_ordered<E, C>(conn: &C, offset: Option<u64>, limit: Option<u64>) -> db::Result<Vec<AuditRow>>
where
	E: AuditEntity,
	C: ConnectionTrait,
{
	let models = E::find()
		.order_by_asc(E::label_column())
		.order_by_asc(E::row_id_column())
		.offset(offset)
		.limit(limit)
		.all(conn)
		.await?;
	Ok(models.into_iter().map(E::into_row).collect())
}

async fn count_rows_where<E, C>(conn: &C, condition: Condition) -> db::Result<u64>
where
	E: AuditEntity,
	C: ConnectionTrait,
{
	let count: Option<i64> = E::find()
		.select_only()
		.column_as(Expr::col(E::row_id_column()).count(), "count")
		.filter(condition)
		.into_tuple()
		.one(conn)
		.await?;
	Ok(count.unwrap_or(0) as u64)
}

async fn count_priorities<E, C>(conn: &C) -> db::Result<Vec<(Option<String>, u64)>>
where
	E: AuditEntity,
	C: ConnectionTrait,
{
	let counts: Vec<(Option<String>, i64)> = E::find()
		.select_only()
		.column(E::priority_column())
		.column_as(Expr::col(E::row_id_column()).count(), "count")
		.group_by(E::priority_column())
		.into_tuple()
		.all(conn)
		.await?;
	Ok(counts
		.into_iter()
		.map(|(priority, count)| (priority, count as u64))
		.collect())
}

async fn update_key<E, C>(conn: &C, key: i64, values: Vec<(E::Column, Value)>) -> db::Result<u64>
where
	E: AuditEntity,
	C: ConnectionTrait,
{
	let mut update = E::update_many().filter(E::key_column().eq(key));
	for (column, value) in values {
		update = update.col_expr(column, Expr::value(value));
	}
	let result = update.exec(conn).await?;
	Ok(result.rows_affected)
}

/// The coarse date window used to pre-select history rows.
fn date_window<E>(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Condition
where
	E: AuditEntity,
{
	let mut condition = Condition::all();
	if let Some(start) = start {
		condition = condition.add(
			Condition::any()
				.add(E::created_on_column().gte(start))
				.add(E::modified_on_column().gte(start)),
		);
	}
	if let Some(end) = end {
		condition = condition.add(
			Condition::any()
				.add(E::created_on_column().lte(end))
				.add(E::modified_on_column().lte(end))
				.add(E::created_on_column().is_null()),
		);
	}
	condition
}


#[async_trait]
pub trait AuditStore: PersistenceHandle + Sync {
	/// All rows of a record, the current version first.
	async fn load_versions(&self, kind: RecordKind, key: i64) -> db::Result<Vec<AuditRow>> {
		with_entity!(kind, E => {
			load_rows_where::<E, _>(self.inner(), Condition::all().add(E::key_column().eq(key))).await
		})
	}

	async fn load_current(&self, kind: RecordKind, key: i64) -> db::Result<Option<AuditRow>> {
		Ok(self.load_versions(kind, key).await?.into_iter().next())
	}

	/// Every physical row of a table, the most recently changed first.
	async fn load_rows(&self, kind: RecordKind) -> db::Result<Vec<AuditRow>> {
		with_entity!(kind, E => load_rows_where::<E, _>(self.inner(), Condition::all()).await)
	}

	/// The rows that were created or modified inside the given window, the most
	/// recently changed first.
	async fn load_rows_between(
		&self, kind: RecordKind, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>,
	) -> db::Result<Vec<AuditRow>> {
		with_entity!(kind, E => {
			load_rows_where::<E, _>(self.inner(), date_window::<E>(start, end)).await
		})
	}

	/// Every physical row of a table, sorted on its label.
	async fn load_rows_by_label(&self, kind: RecordKind) -> db::Result<Vec<AuditRow>> {
		with_entity!(kind, E => load_rows_ordered::<E, _>(self.inner(), None, None).await)
	}

	/// A slice of the rows of a table, sorted on their label.
	async fn load_page(&self, kind: RecordKind, offset: u64, limit: u64) -> db::Result<Vec<AuditRow>> {
		with_entity!(kind, E => {
			load_rows_ordered::<E, _>(self.inner(), Some(offset), Some(limit)).await
		})
	}

	async fn count_rows(&self, kind: RecordKind) -> db::Result<u64> {
		with_entity!(kind, E => count_rows_where::<E, _>(self.inner(), Condition::all()).await)
	}

	/// The number of rows per distinct priority value.
	async fn count_priorities(&self, kind: RecordKind) -> db::Result<Vec<(Option<String>, u64)>> {
		with_entity!(kind, E => count_priorities::<E, _>(self.inner()).await)
	}

	/// Sets the priority of a record. Returns the number of rows touched, which
	/// is zero when the record doesn't exist.
	async fn update_priority(&self, kind: RecordKind, key: i64, priority: &str) -> db::Result<u64> {
		with_entity!(kind, E => {
			let values = vec![(E::priority_column(), Value::from(priority))];
			update_key::<E, _>(self.inner(), key, values).await
		})
	}

	/// Sets the observation of a record, and its priority if one is given.
	async fn update_observation(
		&self, kind: RecordKind, key: i64, text: &str, priority: Option<&str>,
	) -> db::Result<u64> {
		with_entity!(kind, E => {
			let mut values = vec![(E::observation_column(), Value::from(text))];
			if let Some(p) = priority {
				values.push((E::priority_column(), Value::from(p)));
			}
			update_key::<E, _>(self.inner(), key, values).await
		})
	}

	async fn mark_read(&self, kind: RecordKind, key: i64) -> db::Result<u64> {
		with_entity!(kind, E => {
			let values = vec![(E::read_column(), Value::from(1i32))];
			update_key::<E, _>(self.inner(), key, values).await
		})
	}
}

#[async_trait]
pub trait LinkStore: PersistenceHandle + Sync {
	async fn insert_link(
		&self, refs: &LinkRefs, created_by: Option<i64>, created_on: NaiveDateTime,
	) -> db::Result<dependency::Model> {
		let model = dependency::ActiveModel {
			id: NotSet,
			sql_id: Set(refs.sql),
			report_id: Set(refs.report),
			formula_id: Set(refs.formula),
			created_on: Set(created_on),
			created_by: Set(created_by),
		};
		Ok(model.insert(self.inner()).await?)
	}

	async fn load_link(&self, id: i64) -> db::Result<Option<dependency::Model>> {
		Ok(dependency::Entity::find_by_id(id)
			.one(self.inner())
			.await?)
	}

	/// All links, the most recently created first.
	async fn load_links(&self) -> db::Result<Vec<dependency::Model>> {
		Ok(dependency::Entity::find()
			.order_by_desc(dependency::Column::CreatedOn)
			.order_by_desc(dependency::Column::Id)
			.all(self.inner())
			.await?)
	}

	/// Returns whether the link existed.
	async fn delete_link(&self, id: i64) -> db::Result<bool> {
		let result = dependency::Entity::delete_by_id(id)
			.exec(self.inner())
			.await?;
		Ok(result.rows_affected > 0)
	}

	async fn count_links(&self) -> db::Result<u64> {
		let count: Option<i64> = dependency::Entity::find()
			.select_only()
			.column_as(Expr::col(dependency::Column::Id).count(), "count")
			.into_tuple()
			.one(self.inner())
			.await?;
		Ok(count.unwrap_or(0) as u64)
	}
}

#[async_trait]
pub trait ObservationStore: PersistenceHandle + Sync {
	async fn insert_observation(
		&self, text: &str, created_by: Option<i64>, created_on: NaiveDateTime,
	) -> db::Result<i64> {
		let model = observation::ActiveModel {
			id: NotSet,
			text: Set(text.to_string()),
			created_by: Set(created_by),
			created_on: Set(created_on),
		};
		let result = observation::Entity::insert(model)
			.exec(self.inner())
			.await?;
		Ok(result.last_insert_id)
	}
}


impl<T> AuditStore for T where T: PersistenceHandle + Sync {}

impl<T> LinkStore for T where T: PersistenceHandle + Sync {}

impl<T> ObservationStore for T where T: PersistenceHandle + Sync {}
