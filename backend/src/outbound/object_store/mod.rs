//! Profile picture object store adapters.

mod local_store;

pub use local_store::LocalProfileImageStore;
