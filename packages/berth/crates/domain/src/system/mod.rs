pub mod store;

pub use store::{LayerKey, LayerMetadata, LayerStore, StoreError};
