//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Translates
//! JSON requests into domain commands, domain results into shared DTOs, and
//! domain errors into status codes.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: one `router()` per resource under `/api`
//! - **Acting Party**: the `X-Actor-Role` / `X-Actor-Id` headers become an
//!   explicit `Principal` for every guarded operation
//! - **Error Translation**: a single `DomainError` to status mapping with a
//!   `{"error": ...}` body

pub mod rest;

pub use rest::*;
