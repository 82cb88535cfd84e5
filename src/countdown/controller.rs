use std::{
    future::Future,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, info};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    events::{emit, EventSink, COUNTDOWN_CHANGED},
    quiz::ChoiceKey,
};

use super::CountdownState;

struct Ticker {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Confirmation gate between a recognized answer gesture and its commit.
///
/// Arming captures the label and starts a chain of one-second sleeps; the
/// label is committed when the count reaches zero unless `cancel` ran first.
#[derive(Clone)]
pub struct CountdownController {
    state: Arc<Mutex<CountdownState>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    sink: Arc<dyn EventSink>,
    tick_interval: Duration,
    seconds: Arc<AtomicU32>,
}

impl CountdownController {
    pub fn new(sink: Arc<dyn EventSink>, seconds: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(CountdownState::new())),
            ticker: Arc::new(Mutex::new(None)),
            sink,
            tick_interval: Duration::from_secs(1),
            seconds: Arc::new(AtomicU32::new(sanitize_seconds(seconds))),
        }
    }

    /// Applies to the next arm; a running countdown keeps its length.
    pub fn set_seconds(&self, seconds: u32) {
        self.seconds.store(sanitize_seconds(seconds), Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> CountdownState {
        *self.state.lock().await
    }

    #[cfg(test)]
    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }

    /// Start the countdown for `label`. Returns `false` without touching
    /// anything when a countdown is already running.
    pub async fn arm<F, Fut>(&self, label: ChoiceKey, on_commit: F) -> bool
    where
        F: FnOnce(ChoiceKey) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut ticker_guard = self.ticker.lock().await;
        {
            let mut state = self.state.lock().await;
            if state.active {
                return false;
            }
            state.arm(label, self.seconds.load(Ordering::SeqCst));
            emit(self.sink.as_ref(), COUNTDOWN_CHANGED, &*state);
        }

        info!("Countdown armed for answer {}", label.as_str());

        if let Some(previous) = ticker_guard.take() {
            // Finished tickers linger until the next arm
            previous.cancel_token.cancel();
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_countdown(
            self.state.clone(),
            self.sink.clone(),
            self.tick_interval,
            cancel_token.clone(),
            on_commit,
        ));

        *ticker_guard = Some(Ticker {
            cancel_token,
            handle,
        });
        true
    }

    /// Drop a pending commit. Safe to call when idle.
    pub async fn cancel(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(ticker) = ticker_guard.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }

        let mut state = self.state.lock().await;
        if state.active {
            let dropped = state.clear();
            debug!("Countdown cancelled, dropped answer {:?}", dropped);
            emit(self.sink.as_ref(), COUNTDOWN_CHANGED, &*state);
        }
    }
}

fn sanitize_seconds(seconds: u32) -> u32 {
    seconds.max(1)
}

async fn run_countdown<F, Fut>(
    state: Arc<Mutex<CountdownState>>,
    sink: Arc<dyn EventSink>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
    on_commit: F,
) where
    F: FnOnce(ChoiceKey) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    // One single-shot sleep per displayed second
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => return,
            _ = time::sleep(tick_interval) => {}
        }

        let mut guard = state.lock().await;
        if cancel_token.is_cancelled() || !guard.active {
            return;
        }
        if guard.tick() == 0 {
            break;
        }
        emit(sink.as_ref(), COUNTDOWN_CHANGED, &*guard);
    }

    let label = {
        let mut guard = state.lock().await;
        if cancel_token.is_cancelled() {
            return;
        }
        let label = guard.clear();
        emit(sink.as_ref(), COUNTDOWN_CHANGED, &*guard);
        label
    };

    if let Some(label) = label {
        info!("Countdown elapsed, committing answer {}", label.as_str());
        on_commit(label).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use tokio::sync::mpsc;

    fn controller() -> (CountdownController, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        (CountdownController::new(sink.clone(), 5), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn commits_armed_label_once_after_five_ticks() {
        let (countdown, sink) = controller();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let armed = countdown
            .arm(ChoiceKey::C, move |label| async move {
                let _ = tx.send(label);
            })
            .await;
        assert!(armed);

        // a different gesture mid-countdown does not re-arm
        assert!(!countdown.arm(ChoiceKey::A, |_| async {}).await);

        time::sleep(Duration::from_millis(4_500)).await;
        let mid = countdown.snapshot().await;
        assert!(mid.active);
        assert_eq!(mid.remaining, 1);
        assert_eq!(mid.pending_label, Some(ChoiceKey::C));
        assert!(rx.try_recv().is_err());

        time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(rx.recv().await, Some(ChoiceKey::C));
        assert_eq!(rx.recv().await, None);
        assert_eq!(countdown.snapshot().await, CountdownState::default());

        let remaining: Vec<u64> = sink
            .named(COUNTDOWN_CHANGED)
            .iter()
            .map(|payload| payload["remaining"].as_u64().unwrap())
            .collect();
        assert_eq!(remaining, vec![5, 4, 3, 2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_commit() {
        let (countdown, _sink) = controller();
        let (tx, mut rx) = mpsc::unbounded_channel::<ChoiceKey>();

        countdown
            .arm(ChoiceKey::B, move |label| async move {
                let _ = tx.send(label);
            })
            .await;
        time::sleep(Duration::from_millis(2_500)).await;
        countdown.cancel().await;

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(!countdown.is_active().await);
    }

    #[tokio::test(start_paused = true)]
    async fn can_rearm_after_commit() {
        let (countdown, _sink) = controller();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let first = tx.clone();
        countdown
            .arm(ChoiceKey::A, move |label| async move {
                let _ = first.send(label);
            })
            .await;
        time::sleep(Duration::from_millis(5_100)).await;

        assert!(
            countdown
                .arm(ChoiceKey::D, move |label| async move {
                    let _ = tx.send(label);
                })
                .await
        );
        time::sleep(Duration::from_millis(5_100)).await;

        assert_eq!(rx.recv().await, Some(ChoiceKey::A));
        assert_eq!(rx.recv().await, Some(ChoiceKey::D));
    }

    #[tokio::test(start_paused = true)]
    async fn duration_change_applies_to_next_arm() {
        let (countdown, _sink) = controller();
        countdown.set_seconds(2);
        countdown.arm(ChoiceKey::A, |_| async {}).await;
        assert_eq!(countdown.snapshot().await.remaining, 2);

        time::sleep(Duration::from_millis(2_100)).await;
        assert!(!countdown.is_active().await);
    }
}
