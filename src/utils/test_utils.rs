//! Test utilities for interop testing.
