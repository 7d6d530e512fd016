//! Core library for navlinks
//!
//! This crate implements the **Functional Core** of the navlinks application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`navlinks_core`** (this crate): Pure transformation functions with zero I/O
//! - **`navlinks`**: Notion client, snapshot cache, CLI and HTTP server (the Imperative Shell)
//!
//! Everything here takes raw Notion JSON (or already normalized values) and
//! returns plain data. No network, no clocks, no shared state.
//!
//! # Module Organization
//!
//! - [`notion`]: Wire types for pages, properties and query requests
//! - [`links`]: Normalization of link pages into [`links::LinkEntry`]
//! - [`order`]: Category ranks and the display order of entries
//! - [`database`]: Title, icon and cover of the links database
//! - [`retry`]: Backoff policy for upstream requests
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use navlinks_core::links::normalize_all;
//! use navlinks_core::order::{apply_order, build_category_order};
//!
//! let batch = normalize_all(&link_pages);
//! let order = build_category_order(&config_pages);
//! let entries = apply_order(&batch.entries, &order);
//! ```

pub mod database;
pub mod links;
pub mod notion;
pub mod order;
pub mod retry;
