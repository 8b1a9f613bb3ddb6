pub mod config;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{BpsimError, Result};
pub use event::{EventBus, SimulationEvent, SkipReason};
pub use traits::{Computation, WorkKind, WorkSimulator};
pub use types::*;
