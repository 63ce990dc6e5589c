//! End-to-end tests for dlwatch.
//!
//! These tests run the real `dlwatch` binary against a fake job server on
//! localhost. They cover the plain watch flow, the admin commands and the
//! failure exits that unit tests cannot see.
//!
//! # Running
//!
//! ```sh
//! cargo test --test e2e
//! cargo test --test e2e -- --nocapture
//! ```

mod harness;

mod admin;
mod cli;
mod errors;
