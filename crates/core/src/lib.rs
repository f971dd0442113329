#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! Core library for GameSmith.
//!
//! `gamesmith_core` turns a short game idea into a playable, self-contained
//! HTML5 document and manages its sandboxed preview:
//! - prompt construction via [`prompt`]
//! - provider calls with bounded retry via [`client`]
//! - marker-based validation of model output via [`extract`]
//! - the single live preview resource via [`preview`]
//! - pipeline orchestration and the hosting-UI API via [`engine`]
//! - layered configuration via [`config`] and shared types via [`types`]
//!
//! The generated game is treated as an opaque artifact: it is never parsed,
//! linted, or executed here. The hosting surface renders it inside the
//! sandbox described by each preview handle.
//!
//! # Quick Start
//!
//! ```no_run
//! use gamesmith_core::client::MockBackend;
//! use gamesmith_core::engine::Engine;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = "<!--BEGIN_GAME_HTML--><html><body>snake</body></html><!--END_GAME_HTML-->";
//! let mut engine = Engine::new(MockBackend::replying(raw));
//! let doc = engine.generate("snake game").await?;
//! assert!(doc.html().contains("<html"));
//! assert!(engine.active_preview().is_some());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod extract;
pub mod preview;
pub mod prompt;
pub mod types;
