//! The three kinds of audited records, their priorities, and a kind-agnostic
//! view on a single physical audit row.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::common::serialize_timestamp;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
	/// `AUD_SQL`: SQL sentences, keyed by sentence code.
	Sql,
	/// `AUD_REPORT`: reports, keyed by their numeric id.
	Report,
	/// `AUD_FV`: visual formulas, keyed by their numeric id.
	Formula,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Priority {
	Alta,
	Media,
	Baixa,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownTable(pub String);

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownKind(pub String);

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownPriority(pub String);

/// One physical row of one of the AUD tables.
///
/// Serializes to the column layout of the external tables, with the natural
/// key exposed as `id`.
#[derive(Clone, Debug, Serialize)]
pub struct AuditRow {
	#[serde(skip)]
	pub kind: RecordKind,
	#[serde(skip)]
	pub row_id: i64,
	#[serde(rename = "id")]
	pub key: i64,
	#[serde(flatten)]
	pub detail: RecordDetail,
	#[serde(rename = "prioridade")]
	pub priority: Option<String>,
	#[serde(rename = "observacao")]
	pub observation: Option<String>,
	#[serde(rename = "lida")]
	pub read: i32,
	#[serde(rename = "reccreatedby")]
	pub created_by: Option<String>,
	#[serde(rename = "reccreatedon", serialize_with = "serialize_timestamp")]
	pub created_on: Option<NaiveDateTime>,
	#[serde(rename = "recmodifiedby")]
	pub modified_by: Option<String>,
	#[serde(rename = "recmodifiedon", serialize_with = "serialize_timestamp")]
	pub modified_on: Option<NaiveDateTime>,
}

/// The columns that differ per table.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum RecordDetail {
	Sql {
		codsentenca: i64,
		codcoligada: Option<i32>,
		aplicacao: Option<String>,
		titulo: Option<String>,
		sentenca: Option<String>,
		tamanho: Option<i32>,
	},
	Report {
		codcoligada: Option<i32>,
		codaplicacao: Option<i32>,
		codigo: Option<String>,
		descricao: Option<String>,
	},
	Formula {
		codcoligada: Option<i32>,
		nome: Option<String>,
		descricao: Option<String>,
		idcategoria: Option<i32>,
		ativo: bool,
	},
}


impl RecordKind {
	/// All kinds, in origin precedence order.
	pub const ALL: [RecordKind; 3] = [Self::Sql, Self::Report, Self::Formula];

	/// Parses a table name like `AUD_SQL`, ignoring case.
	pub fn from_table(table: &str) -> Result<Self, UnknownTable> {
		match table.trim().to_uppercase().as_str() {
			"AUD_SQL" => Ok(Self::Sql),
			"AUD_REPORT" => Ok(Self::Report),
			"AUD_FV" => Ok(Self::Formula),
			_ => Err(UnknownTable(table.to_string())),
		}
	}

	/// Parses the short kind tag used in link requests and notification ids.
	pub fn from_tag(tag: &str) -> Result<Self, UnknownKind> {
		match tag {
			"sql" => Ok(Self::Sql),
			"report" => Ok(Self::Report),
			"fv" => Ok(Self::Formula),
			_ => Err(UnknownKind(tag.to_string())),
		}
	}

	pub fn table(&self) -> &'static str {
		match self {
			Self::Sql => "AUD_SQL",
			Self::Report => "AUD_REPORT",
			Self::Formula => "AUD_FV",
		}
	}

	pub fn tag(&self) -> &'static str {
		match self {
			Self::Sql => "sql",
			Self::Report => "report",
			Self::Formula => "fv",
		}
	}

	/// Upper-case label shown to users.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Sql => "SQL",
			Self::Report => "REPORT",
			Self::Formula => "FV",
		}
	}

	/// Short label used in link descriptions.
	pub fn short_label(&self) -> &'static str {
		match self {
			Self::Sql => "SQL",
			Self::Report => "REP",
			Self::Formula => "FV",
		}
	}

	/// Lower value wins the origin role of a dependency link.
	pub fn precedence(&self) -> u8 {
		match self {
			Self::Sql => 0,
			Self::Report => 1,
			Self::Formula => 2,
		}
	}
}

impl fmt::Display for RecordKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.table()) }
}

impl Priority {
	pub const ALL: [Priority; 3] = [Self::Alta, Self::Media, Self::Baixa];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Alta => "Alta",
			Self::Media => "Média",
			Self::Baixa => "Baixa",
		}
	}

	pub fn rank(&self) -> u8 {
		match self {
			Self::Alta => 3,
			Self::Media => 2,
			Self::Baixa => 1,
		}
	}

	/// Maps any stored value onto one of the three levels, defaulting to
	/// `Baixa` for anything unset or unrecognized.
	pub fn normalize(value: Option<&str>) -> Self {
		let value = match value {
			Some(v) => v.trim().to_lowercase(),
			None => return Self::Baixa,
		};
		match value.as_str() {
			"alta" => Self::Alta,
			"média" | "media" => Self::Media,
			_ => Self::Baixa,
		}
	}
}

impl FromStr for Priority {
	type Err = UnknownPriority;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|p| p.as_str() == s)
			.ok_or_else(|| UnknownPriority(s.to_string()))
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

/// Rank of a stored priority value: Alta 3, Média 2, Baixa 1, anything else 0.
pub fn priority_rank(value: Option<&str>) -> u8 {
	value
		.and_then(|v| v.parse::<Priority>().ok())
		.map(|p| p.rank())
		.unwrap_or(0)
}

/// Merges a newly requested priority into an existing one, the highest
/// ranking value winning.
///
/// An empty new value keeps the existing one, and an empty existing value is
/// replaced by the new one outright. On equal rank the existing value stays.
pub fn max_priority<'a>(existing: Option<&'a str>, new: Option<&'a str>) -> Option<&'a str> {
	let new = match new.filter(|n| !n.is_empty()) {
		None => return existing,
		Some(n) => n,
	};
	let existing = match existing.filter(|e| !e.is_empty()) {
		None => return Some(new),
		Some(e) => e,
	};

	match priority_rank(Some(new)).cmp(&priority_rank(Some(existing))) {
		Ordering::Greater => Some(new),
		_ => Some(existing),
	}
}

impl AuditRow {
	/// `modified_on` if present, else `created_on`.
	pub fn effective_timestamp(&self) -> Option<NaiveDateTime> {
		self.modified_on.or(self.created_on)
	}

	/// The user responsible for this version of the record.
	pub fn responsible(&self) -> Option<&str> {
		self.modified_by
			.as_deref()
			.filter(|s| !s.is_empty())
			.or(self.created_by.as_deref().filter(|s| !s.is_empty()))
	}

	/// The human readable name of the record, if it has one.
	pub fn name(&self) -> Option<&str> {
		let name = match &self.detail {
			RecordDetail::Sql { titulo, .. } => titulo,
			RecordDetail::Report { codigo, .. } => codigo,
			RecordDetail::Formula { nome, .. } => nome,
		};
		name.as_deref().filter(|n| !n.is_empty())
	}

	/// The record's name, or its natural key when it has none.
	pub fn name_or_key(&self) -> String {
		self.name()
			.map(|n| n.to_string())
			.unwrap_or_else(|| self.key.to_string())
	}

	pub fn is_read(&self) -> bool { self.read != 0 }

	/// The non-empty priority value, if any.
	pub fn priority(&self) -> Option<&str> { self.priority.as_deref().filter(|p| !p.is_empty()) }

	/// The non-empty observation, if any.
	pub fn observation(&self) -> Option<&str> {
		self.observation.as_deref().filter(|o| !o.is_empty())
	}
}
