//! HTTP control surface: rotation status and toggle, panel CRUD. JSON in
//! and out; no HTML is served here.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, serve};
