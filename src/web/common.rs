use std::fmt::{Debug, Display};

use axum::{
	body::{Body, Bytes},
	http::{header, HeaderMap, StatusCode},
	response::{IntoResponse, Response},
};
use log::*;
use serde::{de::DeserializeOwned, *};

use crate::{
	api::{self, Error},
	trace::Traced,
};


/// Header carrying the id of the user on whose behalf a request is made.
pub const USER_ID_HEADER: &str = "x-user-id";

/// An id that clients may send either as a JSON number or as a numeric string.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IdValue {
	Number(i64),
	Text(String),
}


impl IdValue {
	pub fn to_i64(&self) -> Option<i64> {
		match self {
			Self::Number(n) => Some(*n),
			Self::Text(s) => s.trim().parse().ok(),
		}
	}
}


pub fn json_response(status: StatusCode, json: &impl Serialize) -> Response {
	match serde_json::to_vec(json) {
		Ok(body) => (
			status,
			[(header::CONTENT_TYPE, "application/json")],
			Body::from(body),
		)
			.into_response(),
		Err(e) => server_error_response(e, "unable to serialize response"),
	}
}

pub fn ok_response(json: &impl Serialize) -> Response { json_response(StatusCode::OK, json) }

pub fn no_content_response() -> Response { StatusCode::NO_CONTENT.into_response() }

pub fn error_response<S>(status: StatusCode, message: S) -> Response
where
	S: Into<String>,
{
	let string: String = message.into();
	if status.as_u16() >= 400 {
		warn!("HTTP {} error: {}", status.as_u16(), &string);
	}
	let body = serde_json::json!({ "error": string });
	(
		status,
		[(header::CONTENT_TYPE, "application/json")],
		Body::from(body.to_string()),
	)
		.into_response()
}

pub fn bad_request_response(message: &str) -> Response {
	error_response(StatusCode::BAD_REQUEST, message)
}

pub fn not_found_error_response(message: &str) -> Response {
	error_response(StatusCode::NOT_FOUND, message)
}

pub fn server_error_response<E>(e: E, message: &str) -> Response
where
	E: Debug + Display,
{
	error!("{}: {:?}", message, e);
	error_response(
		StatusCode::INTERNAL_SERVER_ERROR,
		format!("{}: {}", message, e),
	)
}

/// Maps a failed API call onto the matching HTTP status.
pub fn api_error_response(e: Traced<api::Error>, message: &str) -> Response {
	match &*e {
		Error::Validation(m) => bad_request_response(m),
		Error::NotFound(m) => not_found_error_response(m),
		Error::Database(_) => server_error_response(e, message),
	}
}

pub fn parse_json_body<T>(body: &Bytes) -> Result<T, Response>
where
	T: DeserializeOwned,
{
	serde_json::from_slice(body)
		.map_err(|e| bad_request_response(&format!("invalid request body: {}", e)))
}

/// The user id from the request headers, if any is given.
pub fn user_id(headers: &HeaderMap) -> Option<i64> {
	headers
		.get(USER_ID_HEADER)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.trim().parse().ok())
}
