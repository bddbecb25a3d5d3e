//! Client interface to the remote, lazily-evaluated compute service.
//!
//! Handles returned by the service are opaque references into a
//! server-side evaluation graph; every materialization is an explicit
//! awaited call through the [`ComputeService`] trait, so suspension
//! points are visible in type signatures.

pub mod error;
pub mod export_spec;
pub mod handles;
pub mod property;
pub mod service;

pub use error::{ComputeError, ComputeResult};
pub use export_spec::{
    ExportDestination, ExportParams, ExportSpec, FileFormat, TaskHandle, TaskState,
};
pub use handles::{CollectionHandle, ImageHandle};
pub use property::{PixelPrecision, PropertyValue};
pub use service::ComputeService;
