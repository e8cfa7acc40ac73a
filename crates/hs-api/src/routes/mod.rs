//! # Route Modules
//!
//! Each module defines handlers for one API surface area. Routers are
//! assembled in [`crate::app`] and [`crate::HyperMedia::schema_router`].

pub mod health;
pub mod schemas;
