//! Application services over the store ports.

mod task;

pub use task::{
    CreateTaskRequest, CreatedTask, DEFAULT_REPORT_ATTEMPTS, TaskService, TaskServiceError,
    TaskServiceResult,
};
