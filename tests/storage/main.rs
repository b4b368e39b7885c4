//! Integration tests for Layer 1: Storage
//!
//! Tests for reciprocal relationship maintenance through the graph accessors.

mod fixtures;

mod belongs_to;
mod lifecycle;
mod notifications;
