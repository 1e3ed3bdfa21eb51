//! 可取消的任务上下文
//!
//! 一个 `TaskContext` 表示一段生命周期：可以被显式取消，也可以带截止时间。
//! 子上下文只持有父上下文的引用，父上下文结束时子上下文随之结束，
//! 反过来取消子上下文不会影响父上下文。

use std::fmt;
use std::future::{self, Future};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::ContextError;

#[derive(Clone)]
pub struct TaskContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    cancelled: AtomicBool,
    notify: Notify,
    deadline: Option<Instant>,
    parent: Option<TaskContext>,
}

impl TaskContext {
    fn build(parent: Option<&TaskContext>, deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
                deadline,
                parent: parent.cloned(),
            }),
        }
    }

    /// 根上下文，除非显式 `cancel()` 否则永不结束
    pub fn background() -> Self {
        Self::build(None, None)
    }

    /// 派生一个可单独取消的子上下文
    pub fn with_cancel(parent: &TaskContext) -> Self {
        Self::build(Some(parent), None)
    }

    /// 派生一个在 `timeout` 之后结束的子上下文
    pub fn with_timeout(parent: &TaskContext, timeout: Duration) -> Self {
        Self::with_deadline(parent, Instant::now() + timeout)
    }

    pub fn with_deadline(parent: &TaskContext, deadline: Instant) -> Self {
        Self::build(Some(parent), Some(deadline))
    }

    /// 取消当前上下文及其所有子上下文
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    /// 上下文结束的原因；仍然有效时返回 `None`
    pub fn err(&self) -> Option<ContextError> {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return Some(ContextError::Canceled);
        }
        if let Some(deadline) = self.inner.deadline {
            if Instant::now() >= deadline {
                return Some(ContextError::DeadlineExceeded);
            }
        }
        self.inner.parent.as_ref().and_then(|parent| parent.err())
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        let parent = self.inner.parent.as_ref().and_then(|p| p.deadline());
        match (self.inner.deadline, parent) {
            (Some(own), Some(parent)) => Some(own.min(parent)),
            (own, parent) => own.or(parent),
        }
    }

    /// 等待上下文结束（取消、超时或任一祖先结束）
    pub fn done(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // 先登记等待者再检查状态，避免错过 cancel() 的通知
            notified.as_mut().enable();
            if self.is_done() {
                return;
            }

            let parent_done = async {
                match &self.inner.parent {
                    Some(parent) => parent.done().await,
                    None => future::pending::<()>().await,
                }
            };
            let deadline_reached = async {
                match self.inner.deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = notified => {}
                _ = parent_done => {}
                _ = deadline_reached => {}
            }
        })
    }

    /// 让 `fut` 与上下文赛跑：上下文先结束则丢弃 `fut` 并返回结束原因
    pub async fn run_until_done<F>(&self, fut: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            _ = self.done() => Err(self.err().unwrap_or(ContextError::Canceled)),
            output = fut => Ok(output),
        }
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("err", &self.err())
            .field("deadline", &self.deadline())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
