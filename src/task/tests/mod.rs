//! Unit tests for the task board bounded context.
