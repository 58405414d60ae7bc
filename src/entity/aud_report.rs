use sea_orm::entity::prelude::*;

use super::AuditEntity;
use crate::record::{AuditRow, RecordDetail, RecordKind};


#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "AUD_REPORT")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true, column_name = "ROW_ID")]
	pub row_id: i64,
	#[sea_orm(column_name = "ID")]
	pub id: i64,
	#[sea_orm(column_name = "CODCOLIGADA")]
	pub company_code: Option<i32>,
	#[sea_orm(column_name = "CODAPLICACAO")]
	pub application_code: Option<i32>,
	#[sea_orm(column_name = "CODIGO")]
	pub code: Option<String>,
	#[sea_orm(column_name = "DESCRICAO", column_type = "Text", nullable)]
	pub description: Option<String>,
	#[sea_orm(column_name = "PRIORIDADE")]
	pub priority: Option<String>,
	#[sea_orm(column_name = "OBSERVACAO", column_type = "Text", nullable)]
	pub observation: Option<String>,
	#[sea_orm(column_name = "LIDA")]
	pub read: i32,
	#[sea_orm(column_name = "RECCREATEDBY")]
	pub created_by: Option<String>,
	#[sea_orm(column_name = "RECCREATEDON")]
	pub created_on: Option<DateTime>,
	#[sea_orm(column_name = "RECMODIFIEDBY")]
	pub modified_by: Option<String>,
	#[sea_orm(column_name = "RECMODIFIEDON")]
	pub modified_on: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}


impl AuditEntity for Entity {
	const KIND: RecordKind = RecordKind::Report;

	fn key_column() -> Column { Column::Id }

	fn label_column() -> Column { Column::Code }

	fn row_id_column() -> Column { Column::RowId }

	fn priority_column() -> Column { Column::Priority }

	fn observation_column() -> Column { Column::Observation }

	fn read_column() -> Column { Column::Read }

	fn created_on_column() -> Column { Column::CreatedOn }

	fn modified_on_column() -> Column { Column::ModifiedOn }

	fn into_row(model: Model) -> AuditRow {
		AuditRow {
			kind: Self::KIND,
			row_id: model.row_id,
			key: model.id,
			detail: RecordDetail::Report {
				codcoligada: model.company_code,
				codaplicacao: model.application_code,
				codigo: model.code,
				descricao: model.description,
			},
			priority: model.priority,
			observation: model.observation,
			read: model.read,
			created_by: model.created_by,
			created_on: model.created_on,
			modified_by: model.modified_by,
			modified_on: model.modified_on,
		}
	}
}
