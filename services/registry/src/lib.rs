//! Feature-store metadata registry library crate.
//!
//! # Purpose
//! Exposes the registry core (model, codecs, mapper, access model, registry
//! operations, stores) and the HTTP surface wired on top of it, for use by the
//! binary and tests.
pub mod access;
pub mod api;
pub mod app;
pub mod codec;
pub mod config;
pub mod context;
pub mod mapper;
pub mod model;
pub mod observability;
pub mod registry;
pub mod store;
