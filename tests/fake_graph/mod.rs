//! Fake Microsoft Graph server for integration testing
//!
//! An in-process HTTP server that speaks enough of the Graph mail API
//! to drive `GraphClient` end-to-end:
//!
//! token -> list / get -> createReply -> PATCH -> send, and sendMail
//!
//! ## Module layout
//!
//! - `server` -- axum router, handlers, recorded calls, failure injection
//! - `mailbox` -- test data model (messages, builder)

#![allow(dead_code)]

pub mod mailbox;
mod server;

pub use mailbox::MailboxBuilder;
pub use server::FakeGraphServer;
