//! mvvlens - MVV Corpus Similarity & Analytics Engine
//!
//! Turns per-company Mission/Vision/Values text and embeddings into
//! pairwise similarity scores, a 2-D positioning map, uniqueness rankings
//! and quality grades, computed on demand, incrementally, and cached.

pub mod cache;
pub mod commands;
pub mod company;
pub mod corpus;
pub mod engine;
pub mod lexical;
pub mod matrix;
pub mod positions;
pub mod quality;
pub mod scorer;
pub mod similarity;
pub mod uniqueness;
