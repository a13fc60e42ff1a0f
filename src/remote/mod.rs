//! Remote package imports
//!
//! A task may declare a dependency on a remotely hosted package with a
//! reference like `registry:acme/toolkit@^2.0`. The reference is resolved
//! to a concrete version through the registry collaborator, fingerprinted,
//! and materialized once under the cache's artifact directory. Concurrent
//! imports of the same resolved package share a single fetch.

pub mod importer;
pub mod reference;
pub mod registry;
pub mod resolver;

pub use importer::PackageImporter;
pub use reference::RemoteReference;
pub use registry::{DirRegistry, PackageManager, Registries};
pub use resolver::{PackageResolver, ResolvedPackage};
