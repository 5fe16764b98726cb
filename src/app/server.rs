// Server contract used by the app for its primary serving capability.

use anyhow::Result;

use crate::shutdown::Deadline;

/// A network server run alongside the components.
///
/// `listen_and_serve` blocks for the lifetime of the server. A failure is
/// treated as fatal and starts the shutdown sequence. `shutdown` is called
/// before any component is stopped so in-flight requests can drain first.
#[async_trait::async_trait]
pub trait Server: Send + Sync {
    async fn listen_and_serve(&self) -> Result<()>;

    async fn shutdown(&self, deadline: Deadline) -> Result<()>;
}
