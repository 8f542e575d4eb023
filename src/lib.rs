//! Benchmark log summarizer.
//!
//! Lines from a concurrency benchmark run are matched against a family of
//! report patterns ([`patterns`], [`extract`]), grouped per category and
//! metric ([`store`]), reduced to summary statistics ([`aggregate`]), and
//! rendered as text or CSV rows by a [`parsers::LogParser`].

pub mod aggregate;
pub mod config;
pub mod extract;
pub mod output;
pub mod parsers;
pub mod patterns;
pub mod pipeline;
pub mod store;
