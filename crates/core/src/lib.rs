//! facecatalog-core: builds and maintains a catalog of distinct faces seen
//! across a photo corpus.
//!
//! Detection, descriptor computation, decoding and persistence sit behind
//! domain traits; the catalog, its deduplication policy and the ingestion
//! pipeline are implemented here.

pub mod catalog;
pub mod corpus;
pub mod descriptor;
pub mod detection;
pub mod pipeline;
pub mod shared;
