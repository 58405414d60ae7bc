//! A link between two audited records of different kinds. Exactly two of the
//! three reference columns are populated.

use sea_orm::entity::prelude::*;


#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "Cadastro_Dependencias")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true, column_name = "ID")]
	pub id: i64,
	#[sea_orm(column_name = "ID_AUD_SQL")]
	pub sql_id: Option<i64>,
	#[sea_orm(column_name = "ID_AUD_REPORT")]
	pub report_id: Option<i64>,
	#[sea_orm(column_name = "ID_AUD_FV")]
	pub formula_id: Option<i64>,
	#[sea_orm(column_name = "DATA_CRIACAO")]
	pub created_on: DateTime,
	/// Id of the user that created the link, if known.
	#[sea_orm(column_name = "CRIADO_POR")]
	pub created_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
