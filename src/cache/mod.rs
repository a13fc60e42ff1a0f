//! Fingerprint-keyed persistent cache
//!
//! The cache root holds three sibling directories:
//!
//! | Directory   | Contents                                            |
//! |-------------|-----------------------------------------------------|
//! | `entries/`  | fingerprint-named payload envelopes                 |
//! | `artifacts/`| fingerprint-named imported package directories      |
//! | `staging/`  | in-progress fetches, promoted by atomic rename      |
//!
//! Entries and artifacts are addressed solely by fingerprint. Writers
//! publish via write-to-temporary-then-rename, so concurrent readers never
//! observe partial state and no read lock is needed.

pub mod layout;
pub mod store;

pub use layout::CacheLayout;
pub use store::CacheStore;
