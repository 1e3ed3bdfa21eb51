//! # Dogonomics Worker Pool
//!
//! 有界并发任务执行：固定数量的 worker、按提交序号归位的结果、协作式取消

pub mod context;
pub mod error;
pub mod pool;
pub mod runner;

pub use context::TaskContext;
pub use error::{ContextError, TaskError};
pub use pool::{task, Pool, Task, TaskFuture, TaskResult};
pub use runner::run;
