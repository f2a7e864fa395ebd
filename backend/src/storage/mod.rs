//! # Storage Module
//!
//! SQLite persistence for the clinic domain.
//!
//! - **connection**: pool management, schema, and the store-level guards
//!   (CHECK constraints and the appointment overlap triggers)
//! - **repositories**: one repository per table. Methods take a
//!   `&mut SqliteConnection` so the same call can run on a pooled connection
//!   or inside a `WriteTransaction` owned by a domain service.
//! - **traits**: the identity store seam consumed by the directory services

pub mod connection;
pub mod repositories;
pub mod traits;

pub use connection::{DbConnection, WriteTransaction};
pub use repositories::{
    AppointmentRepository, DoctorRepository, NotificationRepository, PatientRepository,
    SlotTaken, UserRepository,
};
pub use traits::IdentityStore;
