//! Test helper modules for trackshelf-ui integration tests
//!
//! Provides reusable test infrastructure components:
//! - StubApi: canned responses with a request log
//! - GatedApi: responses supplied by the test, in any order
//! - FakeBackend: in-process axum server speaking the tracks REST contract

#![allow(dead_code)]

pub mod fake_backend;
pub mod stub_api;

pub use fake_backend::FakeBackend;
pub use stub_api::{page, track, GatedApi, Pending, Request, StubApi};
