//! Chart Pusher Library
//!
//! Uploads packaged charts, and their provenance files when present, to
//! remote registries. The destination URI scheme selects the transport
//! provider; `oci://` is built in.
//!
//! ```no_run
//! use chart_pusher::{Push, RegistryConfiguration};
//!
//! # async fn example() -> chart_pusher::Result<()> {
//! let config = RegistryConfiguration::default();
//! let mut out = std::io::stdout();
//! Push::new()
//!     .run("mychart-1.2.0.tgz", "oci://registry.example.com/charts", &config, &mut out)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod output;
pub mod push;
pub mod pusher;
pub mod registry;

pub use chart::ChartArtifacts;
pub use config::{RegistryConfiguration, RegistryOptions};
pub use error::{PusherError, Result};
pub use output::OutputManager;
pub use push::{Push, PushResult};
pub use pusher::{Provider, ProviderRegistry, PushOutcome, Pusher};
pub use registry::RegistryClient;
