pub mod catalog;
pub mod coordinator;
pub mod ops;

pub use catalog::{LsblkCatalog, MountState, Partition, PartitionSource, PartitionTable};
pub use coordinator::MountCoordinator;
pub use ops::{CommandMountTool, MountTool};
