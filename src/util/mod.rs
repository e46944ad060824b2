//! Environment helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/OS concerns from store logic so stores stay
//! testable with in-memory fakes.

pub mod storage;
