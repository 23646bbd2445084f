//! Sans-IO core of the tangent knowledge-base server.
//!
//! Everything in this crate is a synchronous transformation over an
//! already-loaded document collection: wiki-link parsing, backlink index
//! construction, mention detection, graph shaping, search scoring,
//! embedding similarity, stats aggregation, and the rate-limiter state
//! machine. I/O (file loading, HTTP, the sweep timer) lives in the server
//! crate.

pub mod backlinks;
pub mod document;
pub mod embeddings;
pub mod graph;
pub mod link_parser;
pub mod mentions;
pub mod rate_limit;
pub mod search;
pub mod stats;

pub use backlinks::{build_backlinks_index, BacklinkEntry, BacklinksIndex};
pub use document::Document;
pub use link_parser::{extract_links, normalize_slug, rewrite_wiki_links};
