//! The brain server's public façade: `Brain` glues the template
//! lifecycle (`cognis-engine`),
//! the dead-letter store (`cognis-index`), and the A2A transport
//! (`cognis-transport`) behind one `MessageHandler` implementation that
//! `cognis-cli`'s `serve` subcommand mounts as an HTTP router.

mod brain;
mod config;
mod error;

pub use brain::Brain;
pub use config::BrainConfig;
pub use error::{Error, Result};

pub use cognis_transport::{router, MessageHandler};
