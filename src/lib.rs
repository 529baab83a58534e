//! Inkmark Server Library
//!
//! Text anchoring and highlight overlays for structured documents.
//!
//! # Modules
//!
//! - `dom`: arena document tree, markup parsing, ranges and tree walking
//! - `anchor`: structural paths and selection anchors (build and resolve)
//! - `decoration`: wrapping highlighted text in decoration elements
//! - `overlay`: selection sessions, style application and page restore
//! - `highlights`: highlight records, persistence backends and the store facade
//! - `html`: sanitizing submitted markup
//! - `routes`: HTTP API

pub mod anchor;
pub mod config;
pub mod decoration;
pub mod dom;
pub mod error;
pub mod highlights;
pub mod html;
pub mod overlay;
pub mod routes;
pub mod state;
