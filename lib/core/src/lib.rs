//! Core domain types and utilities for callflow.
//!
//! This crate provides the foundational types shared by every other crate:
//! identifiers, the rootcause-based `Result` alias, and the injectable time
//! sources (`Clock`, `Delay`) that keep execution deterministic under test.

pub mod error;
pub mod id;
pub mod time;

pub use error::Result;
pub use id::{EdgeId, NodeId, ParseIdError, WorkflowId, generated_id};
pub use time::{Clock, Delay, ManualClock, NoDelay, RecordingDelay, SystemClock, TokioDelay};
