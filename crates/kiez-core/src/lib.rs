//! # kiez-core
//!
//! Foundation types for the kiez editorial pipeline.
//!
//! This crate provides the shared vocabulary that all other kiez crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::EventId`], [`ids::ArticleId`], [`ids::ReflectionId`]
//! - **Domain models**: [`models::EventCandidate`], [`models::StoredEvent`],
//!   [`models::ArticleOutput`], [`models::PipelineTrace`], [`models::ReflectionOutput`]
//! - **Enums**: [`models::Category`] and [`models::Language`] with their wire forms
//! - **Slugs**: [`slug::slugify`] and [`slug::unique_slug`] for URL-safe identifiers
//! - **Text**: [`text::word_count`], [`text::strip_quotes`], [`text::truncate_chars`]
//!
//! Error types live with the crate that produces them (`kiez-store`,
//! `kiez-llm`, `kiez-agents`), all built on `thiserror`.
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other kiez crates. No I/O.

#![deny(unsafe_code)]

pub mod ids;
pub mod models;
pub mod slug;
pub mod text;
