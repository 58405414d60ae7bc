pub mod api;
pub mod common;
pub mod config;
pub mod db;
pub mod dependency;
pub mod entity;
pub mod history;
pub mod insight;
pub mod migration;
pub mod notification;
pub mod record;
pub mod store;
pub mod trace;
pub mod web;
