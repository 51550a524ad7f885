//! # mdpages Architecture
//!
//! mdpages is a **UI-agnostic Markdown workspace library**: a set of named
//! documents with autosave, a render pipeline with asynchronous diagram
//! resolution, and a paginated export engine. The CLI is one client of it.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (args.rs + print.rs, wired by main.rs)           │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Normalizes inputs (positions / id prefixes → UUIDs)      │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business logic over the session, renderer and exporter   │
//! │  - Operates on Rust types, returns Rust types               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core                                                       │
//! │  - session/: autosave and preview debouncing                │
//! │  - store/:   documents over a StorageBackend, migration     │
//! │  - render/:  Markdown → VisualTree, diagram resolution      │
//! │  - export/:  layout, page breaking, raster, assembly        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr and never calls
//! `std::process::exit`. Persistence goes through [`store::StorageBackend`]
//! and time through [`session::Clock`], so the whole stack runs against
//! `MemBackend` and `ManualClock` in tests.
//!
//! ## Failure Model
//!
//! Storage failures never abort an edit: the in-memory store stays
//! authoritative and the failure surfaces as a warning on the next
//! `CmdResult`. A diagram that fails to render falls back to its source
//! without affecting the rest of the document. An export either produces a
//! complete artifact or nothing.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`session`]: Active document editing, autosave debounce
//! - [`store`]: Document store, storage backends, legacy migration
//! - [`render`]: Two-phase Markdown render pipeline
//! - [`export`]: Pagination and page export
//! - [`model`]: Core data types (`Document`, persisted formats)
//! - [`index`]: Display positions and document selectors
//! - [`config`]: Configuration management
//! - [`editor`]: External editor integration
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod index;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
