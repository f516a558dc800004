//! # バックグラウンドランナー
//!
//! リクエスト処理の外でジョブを実行する fire-and-forget ランナー。
//!
//! ## 設計方針
//!
//! - **有界キュー + 固定数のワーカー**: キューが満杯なら `schedule` はジョブを破棄して
//!   警告を出す。呼び出し側は決して待たされない。破棄されたジョブ（通知メール）は
//!   再投入されず失われる。取りこぼしを減らすにはキュー容量とワーカー数を設定で増やす
//! - **ジョブ単位の隔離**: 各ジョブは独立したタスクで実行し、panic とタイムアウトは
//!   そのジョブだけを終わらせる
//! - **結果を返さない**: 成否はログにのみ残る。リトライ・キャンセルはしない
//! - **終了時のドレイン**: [`RunnerHandle::shutdown`] はキューに残ったジョブと
//!   実行中のジョブの完了を待つ

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use nailbook_shared::event_log::error as error_field;
use tokio::{
    sync::{Semaphore, mpsc, watch},
    task::JoinHandle,
};

use crate::config::RunnerConfig;

type BoxedJob = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// キューに積まれたジョブ
struct QueuedJob {
    /// ログ出力用のラベル
    label:  &'static str,
    future: BoxedJob,
}

/// ジョブの投入口
///
/// クローンして複数のスケジューラーから共有できる。
#[derive(Clone)]
pub struct BackgroundRunner {
    sender: mpsc::Sender<QueuedJob>,
}

/// ランナーの終了制御
pub struct RunnerHandle {
    shutdown:    watch::Sender<bool>,
    loop_handle: JoinHandle<()>,
}

impl BackgroundRunner {
    /// ランナーを起動する
    ///
    /// tokio ランタイム上で呼び出すこと。
    pub fn start(config: &RunnerConfig) -> (Self, RunnerHandle) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let loop_handle = tokio::spawn(run_loop(receiver, shutdown_rx, *config));

        (
            Self { sender },
            RunnerHandle {
                shutdown,
                loop_handle,
            },
        )
    }

    /// ジョブを投入する（ブロックしない）
    ///
    /// キューが満杯、またはランナーが停止済みの場合はジョブを破棄して `false` を返す。
    pub fn schedule<F>(&self, label: &'static str, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let queued = QueuedJob {
            label,
            future: Box::pin(job),
        };

        match self.sender.try_send(queued) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    error.category = error_field::category::BACKGROUND,
                    error.kind = error_field::kind::QUEUE_FULL,
                    job = label,
                    "バックグラウンドキューが満杯のためジョブを破棄しました"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(
                    error.category = error_field::category::BACKGROUND,
                    job = label,
                    "ランナー停止済みのためジョブを破棄しました"
                );
                false
            }
        }
    }
}

impl RunnerHandle {
    /// 新規投入を止め、残りのジョブの完了を待つ
    ///
    /// `grace` を超えた場合は待つのをやめる（実行中のジョブは中断しない）。
    pub async fn shutdown(self, grace: Duration) {
        let _ = self.shutdown.send(true);
        match tokio::time::timeout(grace, self.loop_handle).await {
            Ok(Ok(())) => tracing::info!("バックグラウンドジョブのドレインが完了しました"),
            Ok(Err(e)) => tracing::error!(error = %e, "ランナーのループが異常終了しました"),
            Err(_) => tracing::warn!(
                grace_secs = grace.as_secs(),
                "ドレインがタイムアウトしました。残りのジョブは破棄されます"
            ),
        }
    }
}

async fn run_loop(
    mut receiver: mpsc::Receiver<QueuedJob>,
    mut shutdown: watch::Receiver<bool>,
    config: RunnerConfig,
) {
    let workers = config.workers.max(1);
    let permits = Arc::new(Semaphore::new(workers));

    loop {
        tokio::select! {
            biased;
            Ok(()) = shutdown.changed() => break,
            job = receiver.recv() => match job {
                Some(job) => launch(job, &permits, config.job_timeout).await,
                None => break,
            },
        }
    }

    // 新規投入を止めてキューの残りを流し切る
    receiver.close();
    while let Some(job) = receiver.recv().await {
        launch(job, &permits, config.job_timeout).await;
    }

    // 全ワーカー枠が戻れば実行中のジョブは無い
    let all = u32::try_from(workers).unwrap_or(u32::MAX);
    let _ = permits.acquire_many(all).await;
}

/// ワーカー枠を確保してジョブを起動する
async fn launch(job: QueuedJob, permits: &Arc<Semaphore>, job_timeout: Duration) {
    let Ok(permit) = permits.clone().acquire_owned().await else {
        return;
    };

    tokio::spawn(async move {
        let _permit = permit;
        run_isolated(job, job_timeout).await;
    });
}

/// ジョブを独立したタスクで実行し、panic とタイムアウトを捕捉する
async fn run_isolated(job: QueuedJob, job_timeout: Duration) {
    let label = job.label;
    let outcome = tokio::spawn(tokio::time::timeout(job_timeout, job.future)).await;

    match outcome {
        Ok(Ok(())) => tracing::debug!(job = label, "バックグラウンドジョブが完了しました"),
        Ok(Err(_)) => tracing::error!(
            error.category = error_field::category::BACKGROUND,
            error.kind = error_field::kind::JOB_TIMEOUT,
            job = label,
            timeout_secs = job_timeout.as_secs(),
            "バックグラウンドジョブがタイムアウトしました"
        ),
        Err(e) if e.is_panic() => tracing::error!(
            error.category = error_field::category::BACKGROUND,
            error.kind = error_field::kind::JOB_PANICKED,
            job = label,
            "バックグラウンドジョブが panic しました"
        ),
        Err(e) => tracing::warn!(job = label, error = %e, "バックグラウンドジョブが中断されました"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;

    fn config(workers: usize, queue_capacity: usize, job_timeout: Duration) -> RunnerConfig {
        RunnerConfig {
            workers,
            queue_capacity,
            job_timeout,
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_投入したジョブが実行される() {
        let (runner, _handle) = BackgroundRunner::start(&RunnerConfig::default());
        let (tx, rx) = oneshot::channel();

        assert!(runner.schedule("test", async move {
            let _ = tx.send(42);
        }));

        assert_eq!(tokio::time::timeout(WAIT, rx).await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_キューが満杯ならジョブを破棄する() {
        let (runner, _handle) = BackgroundRunner::start(&config(1, 1, WAIT));

        // ループがまだ動いていないので 2 件目はキューに入らない
        assert!(runner.schedule("first", async {}));
        assert!(!runner.schedule("second", async {}));
    }

    #[tokio::test]
    async fn test_panicしたジョブは後続のジョブを止めない() {
        let (runner, _handle) = BackgroundRunner::start(&config(1, 4, WAIT));
        let (tx, rx) = oneshot::channel();

        runner.schedule("panics", async { panic!("boom") });
        runner.schedule("after", async move {
            let _ = tx.send("done");
        });

        assert_eq!(tokio::time::timeout(WAIT, rx).await.unwrap().unwrap(), "done");
    }

    #[tokio::test]
    async fn test_タイムアウトしたジョブは打ち切られ後続が実行される() {
        let (runner, _handle) = BackgroundRunner::start(&config(1, 4, Duration::from_millis(50)));
        let (tx, rx) = oneshot::channel();

        runner.schedule("hangs", std::future::pending::<()>());
        runner.schedule("after", async move {
            let _ = tx.send("done");
        });

        assert_eq!(tokio::time::timeout(WAIT, rx).await.unwrap().unwrap(), "done");
    }

    #[tokio::test]
    async fn test_shutdownはキューに残ったジョブを実行してから終わる() {
        let (runner, handle) = BackgroundRunner::start(&config(2, 8, WAIT));
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = counter.clone();
            runner.schedule("count", async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        handle.shutdown(WAIT).await;

        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_shutdown後の投入は破棄される() {
        let (runner, handle) = BackgroundRunner::start(&RunnerConfig::default());

        handle.shutdown(WAIT).await;

        assert!(!runner.schedule("late", async {}));
    }
}
