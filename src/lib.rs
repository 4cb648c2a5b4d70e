//! CET translation bridge
//!
//! A chat-side command interface (`ping`, `version`, `status`,
//! `init_translator`, `translate`) on top of a caching client for the
//! Google Translate v2 REST API.
//!
//! ```ignore
//! use cet_translate::client::{MockMode, MockTransport, TranslationClient};
//! use cet_translate::command::Dispatcher;
//! use cet_translate::config::ClientConfig;
//! use std::sync::Arc;
//!
//! let client = TranslationClient::new(
//!     ClientConfig::default(),
//!     Arc::new(MockTransport::new(MockMode::Echo)),
//! );
//! let mut dispatcher = Dispatcher::new(client);
//! dispatcher.dispatch_line("init_translator my-key").await;
//! assert_eq!(dispatcher.dispatch_line("translate hello en fr").await, "hello_fr");
//! ```

pub mod cache;
pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod extract;

pub use cache::{CacheStats, TranslationCache};
pub use client::{TranslateError, TranslationClient, TranslationResult};
pub use command::{Command, CommandError, Dispatcher};
pub use config::ClientConfig;
