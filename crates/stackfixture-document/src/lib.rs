//! # stackfixture-document
//!
//! Turns a declarative infrastructure document into resolved, classified
//! resource definitions.
//!
//! Handles:
//! - **Loader**: reading the document from disk or from a renderer process.
//! - **Resolver**: `${self:...}` substitution and `${env:...}` stripping.
//! - **Document**: the parsed, resolved document and its accessors.
//! - **Classifier**: grouping resource definitions by kind.
//! - **Session**: the once-per-test-session owner of the document.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod classifier;
pub mod document;
pub mod loader;
pub mod resolver;
pub mod session;
