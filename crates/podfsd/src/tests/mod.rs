//! Test suites for the worker.

mod support;
