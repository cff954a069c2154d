//! # class-catalog
//!
//! Catalogs the classes, doc comments, methods and Spring route annotations of
//! a legacy Java source tree into `|`-delimited CSV files, one file family per
//! path category.
//!
//! ## Architecture
//!
//! - **record**: Class and method records plus their CSV line layouts
//! - **context**: Per-file extraction state (brace depth, doc comment, pending route)
//! - **classify**: Regex-based line classification and token extraction
//! - **engine**: Single-pass extraction state machine with per-category hooks
//! - **category**: Path keyword routing to controller/service/general categories
//! - **writer**: Buffered, size-rotating per-category CSV writer
//! - **scan**: Source file discovery
//! - **pipeline**: Scan driver tying discovery, extraction and writing together
//! - **config**: Flag, environment and keyword-file resolution
//! - **error**: Error taxonomy

pub mod category;
pub mod classify;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod scan;
pub mod writer;
