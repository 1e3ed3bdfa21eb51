//! 有界线程池
//!
//! 固定数量的 worker 从共享的有界队列中取任务执行，每个被取出的任务
//! 恰好产生一个 `TaskResult`。池子在 `Pool::new` 时派生自己的子上下文，
//! `cancel()` 之后尚未开始的任务直接以取消错误结束，已经在跑的任务
//! 通过上下文感知取消并自行退出（协作式，不会被强制中断）。

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::context::TaskContext;
use crate::error::{ContextError, TaskError};

pub type TaskFuture = BoxFuture<'static, anyhow::Result<()>>;

/// 一个可取消的工作单元，只会被调用一次
pub type Task = Box<dyn FnOnce(TaskContext) -> TaskFuture + Send + 'static>;

/// 把一个异步闭包包装成 `Task`
pub fn task<F, Fut>(f: F) -> Task
where
    F: FnOnce(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Box::new(move |ctx| Box::pin(f(ctx)))
}

/// 单个任务的结果，`index` 为任务在提交批次中的位置
#[derive(Debug)]
pub struct TaskResult {
    pub index: usize,
    pub error: Option<TaskError>,
}

impl TaskResult {
    pub fn ok(index: usize) -> Self {
        Self { index, error: None }
    }

    /// 从未提交的任务占位结果
    pub fn not_attempted(index: usize) -> Self {
        Self {
            index,
            error: Some(TaskError::NotAttempted),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

struct IndexedTask {
    index: usize,
    task: Task,
}

/// 在途任务计数：提交时 +1，结果发出后 -1
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn done(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

pub struct Pool {
    workers: usize,
    ctx: TaskContext,
    tasks: Option<mpsc::Sender<IndexedTask>>,
    results: Option<mpsc::UnboundedReceiver<TaskResult>>,
    in_flight: Arc<InFlight>,
    handles: Vec<JoinHandle<()>>,
}

impl Pool {
    /// 创建线程池并立即启动 `workers` 个 worker
    ///
    /// # Panics
    /// `workers == 0` 属于调用方的编程错误，直接 panic。
    /// 必须在 tokio runtime 内调用。
    pub fn new(parent: &TaskContext, workers: usize) -> Self {
        assert!(workers > 0, "worker pool requires at least one worker");

        let ctx = TaskContext::with_cancel(parent);
        // 小缓冲，保证 worker 不空转，同时对提交方形成背压
        let (task_tx, task_rx) = mpsc::channel::<IndexedTask>(workers * 2);
        let (result_tx, result_rx) = mpsc::unbounded_channel::<TaskResult>();
        let task_rx = Arc::new(Mutex::new(task_rx));
        let in_flight = Arc::new(InFlight::default());

        let handles = (0..workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&task_rx),
                    result_tx.clone(),
                    ctx.clone(),
                    Arc::clone(&in_flight),
                ))
            })
            .collect();

        debug!("线程池已启动: workers={}", workers);

        Self {
            workers,
            ctx,
            tasks: Some(task_tx),
            results: Some(result_rx),
            in_flight,
            handles,
        }
    }

    /// 池子自己的上下文（`cancel()` 作用于它）
    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    /// 已提交但尚未产出结果的任务数
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// 提交任务；队列满时阻塞，上下文已结束时立即返回取消错误
    ///
    /// # Panics
    /// 在 `wait()` 之后调用会 panic。
    pub async fn submit(&self, index: usize, task: Task) -> Result<(), ContextError> {
        let sender = self
            .tasks
            .as_ref()
            .expect("submit called after wait(): the task queue is already closed");

        if let Some(err) = self.ctx.err() {
            return Err(err);
        }

        let permit = tokio::select! {
            biased;
            _ = self.ctx.done() => {
                return Err(self.ctx.err().unwrap_or(ContextError::Canceled));
            }
            permit = sender.reserve() => permit,
        };
        let permit = match permit {
            Ok(permit) => permit,
            // 只有全部 worker 都已退出才会发生，worker 只会在队列关闭后退出
            Err(_) => panic!("worker pool task queue closed while still accepting submissions"),
        };

        // 先计数再让任务对 worker 可见，wait() 不会提前看到 0
        self.in_flight.add();
        permit.send(IndexedTask { index, task });
        Ok(())
    }

    /// 取走结果队列的接收端（只能取一次）
    ///
    /// 结果按完成顺序到达，不保证与提交顺序一致。
    pub fn take_results(&mut self) -> mpsc::UnboundedReceiver<TaskResult> {
        self.results
            .take()
            .expect("take_results called twice on the same pool")
    }

    /// 关闭任务队列，等待所有已提交任务产出结果，然后关闭结果队列
    ///
    /// # Panics
    /// 同一个池子调用两次会 panic。
    pub async fn wait(&mut self) {
        let sender = self
            .tasks
            .take()
            .expect("wait called twice on the same pool");
        drop(sender);

        self.in_flight.wait_idle().await;

        // worker 退出时释放各自的结果发送端，结果队列随之关闭
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("worker 异常退出: {}", e);
            }
        }
        debug!("线程池已关闭: workers={}", self.workers);
    }

    /// 取消池子的上下文，不关闭任何队列
    pub fn cancel(&self) {
        self.ctx.cancel();
    }
}

async fn worker_loop(
    worker_id: usize,
    tasks: Arc<Mutex<mpsc::Receiver<IndexedTask>>>,
    results: mpsc::UnboundedSender<TaskResult>,
    ctx: TaskContext,
    in_flight: Arc<InFlight>,
) {
    loop {
        let next = { tasks.lock().await.recv().await };
        let Some(IndexedTask { index, task }) = next else {
            break;
        };

        let error = match ctx.err() {
            Some(err) => Some(TaskError::Cancelled(err)),
            None => execute(task, ctx.clone()).await.err(),
        };
        match &error {
            None => debug!("worker {} 完成任务 {}", worker_id, index),
            Some(e) => debug!("worker {} 任务 {} 结束: {}", worker_id, index, e),
        }

        // 调用方可能已经丢弃了接收端，结果丢弃即可
        let _ = results.send(TaskResult { index, error });
        in_flight.done();
    }
    debug!("worker {} 退出", worker_id);
}

async fn execute(task: Task, ctx: TaskContext) -> Result<(), TaskError> {
    // 捕获 panic，保证一个任务仍然只对应一个结果
    match AssertUnwindSafe(async move { task(ctx).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(TaskError::from_task_error(err)),
        Err(payload) => Err(TaskError::Panicked(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    #[should_panic(expected = "at least one worker")]
    async fn zero_workers_is_a_misuse() {
        let _ = Pool::new(&TaskContext::background(), 0);
    }

    #[tokio::test]
    #[should_panic(expected = "submit called after wait")]
    async fn submit_after_wait_is_a_misuse() {
        let mut pool = Pool::new(&TaskContext::background(), 1);
        pool.wait().await;
        let _ = pool.submit(0, task(|_| async { Ok(()) })).await;
    }

    #[tokio::test]
    async fn results_can_be_drained_after_wait() {
        let mut pool = Pool::new(&TaskContext::background(), 2);
        let mut results = pool.take_results();
        // 超过队列容量，验证 wait() 之前不读结果也不会死锁
        for i in 0..20 {
            pool.submit(i, task(|_| async { Ok(()) })).await.unwrap();
        }
        pool.wait().await;
        assert_eq!(pool.in_flight(), 0);

        let mut seen = Vec::new();
        while let Some(r) = results.recv().await {
            assert!(r.is_ok());
            seen.push(r.index);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn submit_blocks_while_queue_is_full() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let mut pool = Pool::new(&TaskContext::background(), 1);
        let mut results = pool.take_results();

        let (s, r) = (Arc::clone(&started), Arc::clone(&release));
        pool.submit(
            0,
            task(move |_| async move {
                s.notify_one();
                r.notified().await;
                Ok(())
            }),
        )
        .await
        .unwrap();
        // 唯一的 worker 被占住，之后的任务只能留在队列里
        started.notified().await;

        // 队列容量 2 * workers
        for i in 1..=2 {
            tokio::time::timeout(
                Duration::from_millis(500),
                pool.submit(i, task(|_| async { Ok(()) })),
            )
            .await
            .expect("submit within queue capacity should not block")
            .unwrap();
        }

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            pool.submit(3, task(|_| async { Ok(()) })),
        )
        .await;
        assert!(blocked.is_err(), "submit should block while the queue is full");
        assert_eq!(pool.in_flight(), 3);

        release.notify_one();
        tokio::time::timeout(
            Duration::from_secs(2),
            pool.submit(3, task(|_| async { Ok(()) })),
        )
        .await
        .expect("submit should resume once a slot frees up")
        .unwrap();
        pool.wait().await;

        let mut count = 0;
        while let Some(r) = results.recv().await {
            assert!(r.is_ok());
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn task_error_is_captured_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pool = Pool::new(&TaskContext::background(), 1);
        let mut results = pool.take_results();
        let counter = Arc::clone(&calls);
        pool.submit(
            7,
            task(move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("upstream 503"))
            }),
        )
        .await
        .unwrap();
        pool.wait().await;

        let r = results.recv().await.unwrap();
        assert_eq!(r.index, 7);
        assert!(matches!(r.error, Some(TaskError::Failed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_task_still_produces_one_result() {
        let mut pool = Pool::new(&TaskContext::background(), 1);
        let mut results = pool.take_results();
        pool.submit(0, task(|_| async { panic!("boom") })).await.unwrap();
        pool.submit(1, task(|_| async { Ok(()) })).await.unwrap();
        pool.wait().await;

        let mut collected = Vec::new();
        while let Some(r) = results.recv().await {
            collected.push(r);
        }
        collected.sort_by_key(|r| r.index);
        assert_eq!(collected.len(), 2);
        match &collected[0].error {
            Some(TaskError::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(collected[1].is_ok());
    }

    #[tokio::test]
    async fn submit_on_cancelled_pool_returns_cancellation() {
        let pool = Pool::new(&TaskContext::background(), 1);
        pool.cancel();
        let err = pool.submit(0, task(|_| async { Ok(()) })).await.unwrap_err();
        assert_eq!(err, ContextError::Canceled);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn pool_cancel_does_not_cancel_parent() {
        let parent = TaskContext::background();
        let pool = Pool::new(&parent, 1);
        pool.cancel();
        assert!(pool.context().is_done());
        assert!(!parent.is_done());
    }

    #[tokio::test]
    async fn running_task_observes_cancellation() {
        let mut pool = Pool::new(&TaskContext::background(), 1);
        let mut results = pool.take_results();
        pool.submit(
            0,
            task(|ctx| async move {
                ctx.run_until_done(tokio::time::sleep(Duration::from_secs(30)))
                    .await?;
                Ok(())
            }),
        )
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.cancel();
        tokio::time::timeout(Duration::from_secs(2), pool.wait())
            .await
            .expect("cancelled task should return promptly");

        let r = results.recv().await.unwrap();
        assert!(matches!(
            r.error,
            Some(TaskError::Cancelled(ContextError::Canceled))
        ));
    }
}
