use tracing::{debug, error, warn};

use crate::context::TaskContext;
use crate::pool::{Pool, Task, TaskResult};

/// 提交一批任务、等待全部完成，并按提交序号返回结果
///
/// 提交在单独的 tokio 任务里进行，队列背压不会和这里读取结果互相卡住。
/// 上下文结束后停止提交，没来得及提交的任务以 `TaskError::NotAttempted`
/// 占位，返回的 `Vec` 长度总是等于 `tasks.len()`。
///
/// # Panics
/// `workers == 0` 时 panic。
pub async fn run(parent: &TaskContext, workers: usize, tasks: Vec<Task>) -> Vec<TaskResult> {
    let total = tasks.len();
    let mut pool = Pool::new(parent, workers);
    let mut receiver = pool.take_results();

    let submitter = tokio::spawn(async move {
        let mut submitted = 0usize;
        for (index, task) in tasks.into_iter().enumerate() {
            if let Err(e) = pool.submit(index, task).await {
                warn!("停止提交任务: 已提交 {}/{}, 原因: {}", submitted, total, e);
                break;
            }
            submitted += 1;
        }
        pool.wait().await;
        submitted
    });

    let mut results: Vec<TaskResult> = (0..total).map(TaskResult::not_attempted).collect();
    while let Some(result) = receiver.recv().await {
        let index = result.index;
        results[index] = result;
    }

    match submitter.await {
        Ok(submitted) => debug!(
            "批量任务完成: total={}, submitted={}, workers={}",
            total, submitted, workers
        ),
        Err(e) => error!("任务提交协程异常退出: {}", e),
    }

    results
}
