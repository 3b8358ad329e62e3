//! # Resource Service
//!
//! Users and posts served through the generic action pipeline of
//! [`resource_framework`]. Each resource runs as its own actor; callers talk
//! to it through a typed client.
//!
//! ## Module Tour
//!
//! ### 1. The Orchestrator ([`lifecycle`])
//! Builds the shared cache and event bus, starts one actor per resource and
//! wires dependencies between them.
//! - **Key items**: [`ResourceSystem`](lifecycle::ResourceSystem),
//!   [`shutdown`](lifecycle::ResourceSystem::shutdown).
//!
//! ### 2. The Interface ([`clients`])
//! [`UserClient`](clients::UserClient) and [`PostClient`](clients::PostClient)
//! wrap the generic client and return per-resource errors.
//!
//! ### 3. The Resources ([`user_resource`], [`post_resource`])
//! `ResourceEntity` implementations: validation, generated defaults, views,
//! author population, the password-reset mail sent after a user is created.
//!
//! ### 4. Data ([`model`]) and collaborators ([`mailer`], [`config`])
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod mailer;
pub mod model;
pub mod post_resource;
pub mod user_resource;
