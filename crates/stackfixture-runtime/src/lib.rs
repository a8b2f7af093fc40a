//! Resource lifecycle for stackfixture sessions.
//!
//! [`orchestrator::Orchestrator`] turns a [`stackfixture_document::session::Session`]
//! into mocked resources around a test body, using one handler per resource
//! kind from [`handlers::REGISTRY`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod env;
pub mod handlers;
pub mod orchestrator;
pub mod properties;

pub use crate::orchestrator::{ActiveFixture, Orchestrator};
