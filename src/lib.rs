//! Storyboard QC — post-generation quality control for instructional storyboards.
//!
//! A generative model turns a brief into a multi-scene storyboard. This crate
//! decides whether that output can be used: structural validation with a
//! bounded regenerate loop, heuristic complexity classification, interaction
//! density and accessibility linting, and deterministic selection of an
//! interactivity archetype for every scene that needs one.

pub mod core;
pub mod schema;
