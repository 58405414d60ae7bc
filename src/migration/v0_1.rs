use async_trait::async_trait;
use sea_orm::{
	prelude::*, sea_query::*, ConnectionTrait, DatabaseBackend, DatabaseTransaction, Schema,
};

use super::MigrationTrait;
use crate::{entity::*, trace};


pub struct Migration;


async fn create_table<E>(tx: &DatabaseTransaction, schema: &Schema, entity: E) -> trace::Result<(), DbErr>
where
	E: EntityTrait,
{
	let stat = schema
		.create_table_from_entity(entity)
		.if_not_exists()
		.to_owned();
	tx.execute_unprepared(&stat.build(SqliteQueryBuilder))
		.await?;
	Ok(())
}

async fn create_index<C>(
	tx: &DatabaseTransaction, name: &str, table: &str, columns: &[C],
) -> trace::Result<(), DbErr>
where
	C: ColumnTrait,
{
	let mut stat = Index::create();
	stat.if_not_exists().name(name).table(Alias::new(table));
	for column in columns {
		stat.col(*column);
	}
	tx.execute_unprepared(&stat.build(SqliteQueryBuilder))
		.await?;
	Ok(())
}


#[async_trait]
impl MigrationTrait for Migration {
	async fn run(&self, tx: &DatabaseTransaction) -> trace::Result<(), DbErr> {
		let schema = Schema::new(DatabaseBackend::Sqlite);

		// The AUD tables may already have been provisioned by the system of
		// record, in which case they are left untouched.
		create_table(tx, &schema, AudSql).await?;
		create_table(tx, &schema, AudReport).await?;
		create_table(tx, &schema, AudFv).await?;
		create_table(tx, &schema, Dependency).await?;
		create_table(tx, &schema, Observation).await?;

		// History lookups go by natural key
		create_index(
			tx,
			"aud_sql_codsentenca",
			"AUD_SQL",
			&[aud_sql::Column::SentenceCode],
		)
		.await?;
		create_index(tx, "aud_report_id", "AUD_REPORT", &[aud_report::Column::Id]).await?;
		create_index(tx, "aud_fv_id", "AUD_FV", &[aud_fv::Column::Id]).await?;
		create_index(
			tx,
			"cadastro_dependencias_data_criacao",
			"Cadastro_Dependencias",
			&[dependency::Column::CreatedOn],
		)
		.await?;
		Ok(())
	}
}
