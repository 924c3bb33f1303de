mod loro_store;

pub use loro_store::{DocumentStore, DEVFEED_DIR};
