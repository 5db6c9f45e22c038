pub mod duplication_node;
pub mod scheduler_types;
pub mod snapshot;
pub mod task_definition;

pub use duplication_node::{DuplicationNode, NodeMap, Reservation};
pub use scheduler_types::{
    DependentTask, DependentTaskStatus, DependentsPage, GraphInfo, GraphNodeInfo, GraphTaskEntry,
    TaskGraphDocument,
};
pub use snapshot::TaskSnapshot;
pub use task_definition::TaskDefinition;
