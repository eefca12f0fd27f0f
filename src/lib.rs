//! padmap: game controller to application action binding engine
//!
//! Raw hardware frames flow through the device registry, the input
//! normalizer, the binding resolver and its gesture state, and end as
//! actions executed against a [`dispatch::Host`].

pub mod action;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod input;
pub mod paths;
pub mod profile;
pub mod resolver;
pub mod runtime;

pub use engine::{Engine, EngineSettings};
pub use runtime::Runtime;
