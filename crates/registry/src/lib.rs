//! Versioned satellite/sensor/product registry and request validation.

pub mod configmap;
pub mod registry;
pub mod request;
pub mod version;

pub use configmap::ConfigMap;
pub use registry::{ProductMap, ProductRegistry};
pub use request::RequestList;
pub use version::VersionTag;
