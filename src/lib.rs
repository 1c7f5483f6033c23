//! # workdesk
//!
//! Work-order tracking with authenticated owners and idempotent due-soon
//! email reminders.
//!
//! The core is synchronous and stateless between calls: durable state lives
//! behind the storage ports in [`store`], email delivery behind
//! [`store::NotificationGateway`], and time behind [`clock::Clock`].

pub mod auth;
pub mod clock;
pub mod config;
pub mod due;
pub mod error;
pub mod mailer;
pub mod manager;
pub mod model;
pub mod registry;
pub mod store;
