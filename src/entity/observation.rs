use sea_orm::entity::prelude::*;


#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "OBSERVACAO")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true, column_name = "ID")]
	pub id: i64,
	#[sea_orm(column_name = "TEXTO", column_type = "Text")]
	pub text: String,
	#[sea_orm(column_name = "CRIADO_POR")]
	pub created_by: Option<i64>,
	#[sea_orm(column_name = "DATA")]
	pub created_on: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
