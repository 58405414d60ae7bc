pub mod aud_fv;
pub mod aud_report;
pub mod aud_sql;
pub mod dependency;
pub mod observation;

pub use prelude::*;
use sea_orm::EntityTrait;

use crate::record::{AuditRow, RecordKind};


pub mod prelude {
	pub use super::{
		aud_fv::Entity as AudFv, aud_report::Entity as AudReport, aud_sql::Entity as AudSql,
		dependency::Entity as Dependency, observation::Entity as Observation,
	};
}


/// The common shape of the three AUD tables.
pub trait AuditEntity: EntityTrait {
	const KIND: RecordKind;

	/// The natural key, shared by all audit rows of one record.
	fn key_column() -> Self::Column;

	/// The column listings are sorted on.
	fn label_column() -> Self::Column;

	fn row_id_column() -> Self::Column;

	fn priority_column() -> Self::Column;

	fn observation_column() -> Self::Column;

	fn read_column() -> Self::Column;

	fn created_on_column() -> Self::Column;

	fn modified_on_column() -> Self::Column;

	fn into_row(model: Self::Model) -> AuditRow;
}
