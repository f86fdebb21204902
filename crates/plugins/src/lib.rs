//! `plugins` crate — collaborator contracts between the engine and metric plugins.
//!
//! Collector and publisher plugins implement [`MetricProvider`] and
//! [`MetricPublisher`].  The engine crate only ever holds them as trait objects,
//! so new plugins never require engine changes.

pub mod builtin;
pub mod config;
pub mod error;
pub mod metric;
pub mod mock;
pub mod traits;

pub use config::{ConfigMap, ConfigValue, PublishTarget};
pub use error::PluginError;
pub use metric::{Metric, MetricType};
pub use traits::{MetricProvider, MetricPublisher};
