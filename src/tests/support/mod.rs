// Shared test support code for lifecycle scenarios.
// Counting fakes for components and servers plus a shared event journal.

pub mod component;
pub mod harness;
pub mod journal;
pub mod server;

pub use component::FakeComponent;
pub use harness::{join_app, spawn_app, wait_for_state, SCENARIO_TIMEOUT};
pub use journal::Journal;
pub use server::FakeServer;
