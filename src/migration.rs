//! The module for migrating the database.
use std::fmt::Display;

use async_trait::async_trait;
use log::info;
use sea_orm::{sea_query::*, ConnectionTrait, DatabaseTransaction, DbErr, Statement};

use crate::{
	db::{self, Database, PersistenceHandle},
	trace,
};

mod v0_1;


/// The latest database version.
pub const LATEST_VERSION: Version = Version { major: 0, minor: 1 };


#[derive(Clone, Debug)]
pub struct Version {
	major: u32,
	minor: u32,
}

pub struct Migrations {
	/// A list of available migrations, ordered at version
	list: Vec<(Version, Box<dyn MigrationTrait + Send + Sync>)>,
}

#[async_trait]
trait MigrationTrait {
	async fn run(&self, tx: &DatabaseTransaction) -> trace::Result<(), DbErr>;
}


impl Migrations {
	pub fn load() -> Self {
		Self {
			list: vec![(Version::new(0, 1), Box::new(v0_1::Migration))],
		}
	}

	async fn load_version(&self, db: &Database) -> db::Result<Version> {
		let q = Query::select()
			.from(Alias::new("version"))
			.column(Alias::new("major"))
			.column(Alias::new("minor"))
			.to_owned();
		let (sql, values) = q.build(SqliteQueryBuilder);
		let r = db
			.inner()
			.query_one(Statement::from_sql_and_values(db.backend(), sql, values))
			.await?;
		let result = match r {
			Some(r) => r,
			None => return trace::err(db::Error::MissingVersion),
		};
		let major: u32 = result.try_get_by_index(0)?;
		let minor: u32 = result.try_get_by_index(1)?;
		Ok(Version::new(major, minor))
	}

	async fn store_version(&self, tx: &db::Transaction, version: &Version) -> db::Result<()> {
		let q = Query::update()
			.table(Alias::new("version"))
			.values([
				(Alias::new("major"), version.major.into()),
				(Alias::new("minor"), version.minor.into()),
			])
			.to_owned();
		let (sql, values) = q.build(SqliteQueryBuilder);
		tx.inner()
			.execute(Statement::from_sql_and_values(tx.backend(), sql, values))
			.await?;
		Ok(())
	}

	/// Brings the schema up to [`LATEST_VERSION`], running every pending
	/// migration in its own transaction.
	pub async fn run(&self, db: &Database) -> db::Result<()> {
		let mut current_version = self.load_version(db).await?;
		if current_version > LATEST_VERSION {
			return trace::err(db::Error::InvalidVersion(
				current_version.major,
				current_version.minor,
			));
		}

		for (new_version, migration) in &self.list {
			if new_version > &current_version {
				let tx = db.transaction().await?;
				info!(
					"Running database migration from {} to {}...",
					current_version, new_version
				);
				migration
					.run(tx.inner())
					.await
					.map_err(|e| e.map(db::Error::OrmError))?;
				self.store_version(&tx, new_version).await?;
				tx.commit().await?;
				info!("Migrated database to {}.", new_version);
				current_version = new_version.clone();
			}
		}
		Ok(())
	}
}

impl Version {
	pub fn new(major: u32, minor: u32) -> Self { Self { major, minor } }
}

impl Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "v{}.{}", self.major, self.minor)
	}
}

impl PartialEq for Version {
	fn eq(&self, other: &Self) -> bool { self.major == other.major && self.minor == other.minor }
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		match self.major.partial_cmp(&other.major) {
			Some(core::cmp::Ordering::Equal) => {}
			ord => return ord,
		}
		self.minor.partial_cmp(&other.minor)
	}
}
