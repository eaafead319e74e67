pub mod accessor;
pub mod catalog;
pub mod constants;
pub mod container;
pub mod lookup;
pub mod partition;
pub mod starshard_errors;
pub mod store;
pub mod transform;

pub use catalog::{ShardCatalog, ShardDescriptor};
pub use constants::{PartitionKey, SourceId};
pub use lookup::{CoeffBatch, ExtraColumn, StreamOptions, XpCoeffStream};
pub use starshard_errors::StarshardError;
pub use store::XpCoeffStore;
pub use transform::{ColumnTransform, LambdaTransform};
