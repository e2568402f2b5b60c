//! # cmdb-attrs Architecture
//!
//! cmdb-attrs manages the **attribute catalogue** of a configuration
//! management database: the named, typed fields that CI types are built
//! from. It is a library first; the `cmdb-attrs` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - AttributeManager, a thin facade over commands            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Validation, transactions, cache invalidation, index sync │
//! └─────────────────────────────────────────────────────────────┘
//!               │                               │
//!               ▼                               ▼
//! ┌───────────────────────────┐   ┌─────────────────────────────┐
//! │  Collaborators            │   │  Storage Layer (store/)     │
//! │  - choice, cache          │   │  - Database + Transaction   │
//! │  - cascade, search_index  │   │  - MemBackend, FsBackend    │
//! └───────────────────────────┘   └─────────────────────────────┘
//! ```
//!
//! ## Write Path
//!
//! Every write runs in exactly one [`store::Transaction`]. Validation happens
//! inside it against the transaction's snapshot; a failure anywhere before
//! commit drops the transaction and nothing is persisted. After commit the
//! [`cache::AttributeCache`] is invalidated and, for new attributes, the
//! [`search_index::SearchIndexSync`] is notified. Neither of those can fail
//! the write.
//!
//! ## Testing Strategy
//!
//! - **Collaborators and store**: unit tests next to the code
//! - **Commands**: unit tests on `MemBackend`, one module per operation
//! - **API**: dispatch tests only
//! - **Integration** (`tests/`): public API over `FsBackend` and the binary
//!
//! ## Module Overview
//!
//! - [`api`]: `AttributeManager`, the entry point for all operations
//! - [`commands`]: one module per operation
//! - [`choice`]: per value-type choice tables
//! - [`cache`]: read-through attribute cache
//! - [`cascade`]: soft-delete of dependent associations
//! - [`search_index`]: field mappings for the external search index
//! - [`store`]: transactions and storage backends
//! - [`config`]: layered configuration
//! - [`model`]: rows and inputs
//! - [`error`]: error taxonomy

pub mod api;
pub mod cache;
pub mod cascade;
pub mod choice;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod search_index;
pub mod store;
