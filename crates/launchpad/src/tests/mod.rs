//! Test suites for the launch sequencer.

mod lib_api;
mod support;
