//! # Scheduler Field Names and Defaults
//!
//! Names of the task definition fields the retrigger engine reads or rewrites,
//! plus the operational defaults used by configuration. Any field not listed
//! here is carried through duplication untouched.

/// Top-level task definition fields
pub mod fields {
    pub const CREATED: &str = "created";
    pub const DEADLINE: &str = "deadline";
    pub const EXPIRES: &str = "expires";
    pub const PAYLOAD: &str = "payload";
    pub const ARTIFACTS: &str = "artifacts";
    pub const TASK_GROUP_ID: &str = "taskGroupId";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const METADATA: &str = "metadata";

    /// Absolute date fields shifted by the duplication rule
    pub const REBASED_DATES: [&str; 3] = [CREATED, DEADLINE, EXPIRES];

    /// Fields removed from every duplicate; callers re-establish them once new
    /// identifiers exist
    pub const STRIPPED: [&str; 2] = [TASK_GROUP_ID, DEPENDENCIES];
}

/// Scheduler operation names used in errors and log fields
pub mod operations {
    pub const FETCH_TASK: &str = "fetchTask";
    pub const FETCH_GRAPH_NODE: &str = "fetchGraphNode";
    pub const FETCH_GRAPH_INFO: &str = "fetchGraphInfo";
    pub const LIST_DEPENDENT_TASKS: &str = "listDependentTasks";
    pub const CREATE_TASK_GRAPH: &str = "createTaskGraph";
    pub const CREATE_TASK: &str = "createTask";
}

/// Default operational settings
pub mod defaults {
    pub const QUEUE_URL: &str = "http://localhost:8080/queue/v1";
    pub const SCHEDULER_URL: &str = "http://localhost:8080/scheduler/v1";
    pub const REQUEST_TIMEOUT_MS: u64 = 30_000;
    pub const GRAPH_FETCH_CONCURRENCY: usize = 8;
    pub const DEPENDENTS_PAGE_SIZE: u32 = 100;
}
