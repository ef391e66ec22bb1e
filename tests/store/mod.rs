//! Tests for the parameter store

mod cascade_tests;
mod concurrency_tests;
