//! Pagination and timestamp helpers shared by the API and the web layer.

use chrono::{NaiveDateTime, Utc};
use serde::*;


/// Timestamps are rendered as naive ISO-8601, with fractional seconds only
/// when present.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A requested page number of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageNumber {
	Number(u64),
	Last,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
	pub page: PageNumber,
	pub page_size: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidPage;

/// One page of a listing, in the layout list endpoints respond with.
#[derive(Debug, Serialize)]
pub struct Page<T> {
	pub count: u64,
	pub next: Option<String>,
	pub previous: Option<String>,
	pub results: Vec<T>,
}


pub fn current_timestamp() -> NaiveDateTime { Utc::now().naive_utc() }

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
	timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn serialize_timestamp<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(t) => serializer.serialize_str(&format_timestamp(t)),
		None => serializer.serialize_none(),
	}
}

pub fn serialize_datetime<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&format_timestamp(value))
}

/// The query string fragments pointing to the neighbouring pages.
fn page_links(page: u64, page_size: u64, count: u64) -> (Option<String>, Option<String>) {
	let next = if page.saturating_mul(page_size) < count {
		Some(format!("?page={}&page_size={}", page + 1, page_size))
	} else {
		None
	};
	let previous = if page > 1 {
		Some(format!("?page={}&page_size={}", page - 1, page_size))
	} else {
		None
	};
	(next, previous)
}


impl PageRequest {
	/// Parses the paging parameters of the table listings.
	///
	/// A missing, non-numeric or zero page size falls back to the default, and
	/// a page size above the maximum is clamped. The page must be a positive
	/// number or `last`.
	pub fn parse_listing(
		page: Option<&str>, page_size: Option<&str>, default_size: u64, max_size: u64,
	) -> Result<Self, InvalidPage> {
		let page_size = page_size
			.and_then(|s| s.trim().parse::<u64>().ok())
			.filter(|s| *s > 0)
			.map(|s| s.min(max_size))
			.unwrap_or(default_size);

		let page = match page.map(|p| p.trim()) {
			None | Some("") => PageNumber::Number(1),
			Some("last") => PageNumber::Last,
			Some(p) => match p.parse::<u64>() {
				Ok(n) if n > 0 => PageNumber::Number(n),
				_ => return Err(InvalidPage),
			},
		};
		Ok(Self { page, page_size })
	}

	/// Parses the paging parameters of the change history, which only accepts
	/// positive numbers.
	pub fn parse_strict(
		page: Option<&str>, page_size: Option<&str>, default_size: u64,
	) -> Result<Self, InvalidPage> {
		fn positive(value: Option<&str>, default: u64) -> Result<u64, InvalidPage> {
			match value {
				None => Ok(default),
				Some(v) => match v.trim().parse::<u64>() {
					Ok(n) if n > 0 => Ok(n),
					_ => Err(InvalidPage),
				},
			}
		}

		Ok(Self {
			page: PageNumber::Number(positive(page, 1)?),
			page_size: positive(page_size, default_size)?,
		})
	}

	/// The 1-based page number for a listing of `count` items.
	///
	/// Pages past the end are invalid, except for the first page of an empty
	/// listing.
	pub fn resolve(&self, count: u64) -> Result<u64, InvalidPage> {
		let pages = ((count + self.page_size - 1) / self.page_size).max(1);
		match self.page {
			PageNumber::Last => Ok(pages),
			PageNumber::Number(n) if n <= pages => Ok(n),
			PageNumber::Number(_) => Err(InvalidPage),
		}
	}

	/// The page number as given, for listings that simply return an empty
	/// page when going past the end.
	pub fn number(&self) -> u64 {
		match self.page {
			PageNumber::Number(n) => n,
			PageNumber::Last => 1,
		}
	}

	pub fn offset(&self, page: u64) -> u64 { (page - 1).saturating_mul(self.page_size) }
}

impl<T> Page<T> {
	pub fn new(page: u64, page_size: u64, count: u64, results: Vec<T>) -> Self {
		let (next, previous) = page_links(page, page_size, count);
		Self {
			count,
			next,
			previous,
			results,
		}
	}

	/// Cuts the requested page out of a fully loaded listing.
	pub fn slice(page: u64, page_size: u64, mut items: Vec<T>) -> Self {
		let count = items.len() as u64;
		let start = (page - 1).saturating_mul(page_size).min(count) as usize;
		let end = (start as u64).saturating_add(page_size).min(count) as usize;
		let results = items.drain(start..end).collect();
		Self::new(page, page_size, count, results)
	}
}
