//! 任务与上下文错误类型

use thiserror::Error;

/// 上下文结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// 单个任务的失败原因
///
/// `Cancelled` 与 `NotAttempted` 表示任务没有真正跑完，
/// 调用方据此区分"没跑"和"跑了但失败"。
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("任务被取消: {0}")]
    Cancelled(#[from] ContextError),

    #[error("任务执行失败: {0}")]
    Failed(#[source] anyhow::Error),

    #[error("任务 panic: {0}")]
    Panicked(String),

    #[error("任务未提交到线程池")]
    NotAttempted,
}

impl TaskError {
    /// 任务是否因为取消（或未提交）而没有执行完成
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TaskError::Cancelled(_) | TaskError::NotAttempted)
    }

    /// 把任务返回的错误归类：任务自己返回 `ContextError` 时视为取消
    pub(crate) fn from_task_error(err: anyhow::Error) -> Self {
        match err.downcast::<ContextError>() {
            Ok(ctx_err) => TaskError::Cancelled(ctx_err),
            Err(err) => TaskError::Failed(err),
        }
    }
}
