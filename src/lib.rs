//! Language Server Protocol (LSP) implementation for TRLC
//!
//!     This crate is the editor-facing half of the TRLC tooling: it keeps an
//!     in-memory mirror of the workspace, funnels every edit through a single
//!     background validation worker, and answers position-based queries
//!     (definition, references, hover, rename, completion) against the
//!     analysis output of the most recent pass.
//!
//! Architecture
//!
//!     The server follows a layered architecture:
//!
//!     LSP Layer (tower-lsp):
//!         - JSON-RPC communication, handshaking, request routing
//!
//!     Server Layer (server.rs):
//!         - Implements the LanguageServer trait
//!         - Thin handlers: enqueue a change event, or read the current
//!           snapshot and delegate to a query module
//!
//!     Worker Layer (worker.rs):
//!         - The only writer of analysis state; drains the change queue,
//!           applies mutations to the document store, runs one analysis
//!           pass per drain cycle, swaps the snapshot in atomically and
//!           publishes diagnostic deltas
//!
//!     Query Layer (index.rs, resolve.rs, rename.rs, completion.rs):
//!         - Stateless functions over an immutable snapshot
//!         - All logic and dense unit tests
//!
//!     Engine boundary (engine.rs):
//!         - The TRLC grammar, type checker and constraint verifier live
//!           behind the AnalysisEngine trait; this crate only drives
//!           registration and collects the diagnostic stream
//!
//! Concurrency model
//!
//!     Request handlers run concurrently; exactly one validation worker
//!     exists per server. The document store and the change queue are the
//!     only structures written from more than one context. Analysis output
//!     is published as an Arc swapped in wholesale, so a query sees either
//!     the previous pass or the next one, never a torn state. Queries may
//!     be one or more cycles stale relative to the newest edit; that is by
//!     design.
//!
//! Usage
//!
//!     Library:
//!         build a TrlcLanguageServer with a tower_lsp Client and an
//!         implementation of engine::EngineFactory, then serve it over
//!         stdin/stdout with tower_lsp::Server.
//!
//!     Binary:
//!         $ trlc-lsp
//!         Starts the language server on stdin/stdout for editor
//!         integration; --tcp/--host/--port serve over a socket instead.

pub mod completion;
pub mod config;
pub mod diagnostics;
pub mod documents;
pub mod engine;
pub mod features;
pub mod index;
pub mod rename;
pub mod resolve;
pub mod server;
pub mod session;
pub mod symbols;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use server::TrlcLanguageServer;
