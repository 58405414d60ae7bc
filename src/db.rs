mod install;

use std::{path::*, time::Duration};

use log::*;
use sea_orm::*;
use thiserror::Error;

use crate::trace::{self, Traceable, Traced};


#[derive(Clone)]
pub struct Database {
	path: PathBuf,
	orm: DatabaseConnection,
}

pub struct Transaction(pub(crate) DatabaseTransaction);

#[derive(Debug, Error)]
pub enum Error {
	#[error("{0}")]
	OrmError(DbErr),
	#[error("no version information found in the database")]
	MissingVersion,
	/// The schema is of a version that this build doesn't know about.
	#[error("database is at version v{0}.{1}, which is newer than supported")]
	InvalidVersion(u32, u32),
}

pub type Result<T> = trace::Result<T, self::Error>;


/// Anything that queries can be executed on: the database itself or an open
/// transaction.
pub trait PersistenceHandle {
	type Inner: ConnectionTrait;

	fn inner(&self) -> &Self::Inner;

	fn backend(&self) -> DatabaseBackend { self.inner().get_database_backend() }
}


impl Database {
	async fn install(orm: &DatabaseConnection) -> Result<()> {
		for query in install::QUERIES {
			orm.execute_unprepared(query).await?;
		}
		Ok(())
	}

	/// Opens the SQLite database at the given path, creating the file when it
	/// doesn't exist yet.
	pub async fn load(path: PathBuf) -> Result<Self> {
		let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
		opts.idle_timeout(Duration::from_secs(10));
		opts.acquire_timeout(Duration::from_secs(1));
		opts.sqlx_logging(false);
		let orm = sea_orm::Database::connect(opts)
			.await
			.map_err(|e| self::Error::OrmError(e))?;

		Self::install(&orm).await?;
		debug!("Opened database at {}", path.display());
		Ok(Self { path, orm })
	}

	pub fn path(&self) -> &Path { &self.path }

	pub async fn transaction(&self) -> Result<Transaction> {
		let tx = self.orm.begin().await?;
		Ok(Transaction(tx))
	}
}

impl PersistenceHandle for Database {
	type Inner = sea_orm::DatabaseConnection;

	fn inner(&self) -> &Self::Inner { &self.orm }
}

impl PersistenceHandle for Transaction {
	type Inner = sea_orm::DatabaseTransaction;

	fn inner(&self) -> &Self::Inner { &self.0 }
}

impl Transaction {
	pub async fn commit(self) -> Result<()> {
		self.0.commit().await?;
		Ok(())
	}

	pub async fn rollback(self) -> Result<()> {
		self.0.rollback().await?;
		Ok(())
	}
}

impl From<DbErr> for Error {
	fn from(other: DbErr) -> Self { Self::OrmError(other) }
}

impl From<DbErr> for Traced<Error> {
	fn from(other: DbErr) -> Self { Error::OrmError(other).trace() }
}
