//! Route configuration.

pub mod portal_routes;
