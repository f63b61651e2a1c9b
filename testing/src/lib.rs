//! Fake plugin implementations for tests.
//!
//! Explicit, stateful implementations of the plugin contract: a static
//! source with call counting, a source that fails on demand, and a
//! scheduled source that serves different payloads on successive polls.

pub mod fakes;

pub use fakes::{CallCounts, FailingPlugin, FailurePoint, FakePlugin, SequencePlugin};
