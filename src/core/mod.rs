pub mod catalog;
pub mod checksum;
pub mod classifier;
pub mod config;
pub mod contract;
pub mod enforcer;
pub mod lint;
pub mod pipeline;
pub mod sequencer;
