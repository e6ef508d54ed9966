//! Property-based tests for allocation and flag guarantees
