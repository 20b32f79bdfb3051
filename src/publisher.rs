use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Публикует последнее значение после паузы во входящих изменениях.
///
/// Один слот таймера: новое значение отменяет ожидающую публикацию и запускает
/// отсчёт заново. Публикация только по заднему фронту, промежуточные значения
/// не сохраняются. Опубликованное значение лежит в `watch` канале, читатели
/// получают его через [`DebouncedPublisher::subscribe`].
pub struct DebouncedPublisher<T> {
    quiet: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    state: Arc<watch::Sender<T>>,
    published: Arc<AtomicU64>,
}

impl<T> DebouncedPublisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T, quiet: Duration) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            quiet,
            pending: Mutex::new(None),
            state: Arc::new(state),
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Запланировать публикацию, заменив ожидающую
    pub fn schedule(&self, value: T) {
        let mut slot = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }

        let quiet = self.quiet;
        let state = self.state.clone();
        let published = self.published.clone();

        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            state.send_replace(value);
            let count = published.fetch_add(1, Ordering::SeqCst) + 1;
            log::debug!("Published settings snapshot #{}", count);
        }));
    }

    /// Отменить ожидающую публикацию. true, если было что отменять.
    pub fn cancel_pending(&self) -> bool {
        let mut slot = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        match slot.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> T {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

impl<T> Drop for DebouncedPublisher<T> {
    fn drop(&mut self) {
        let slot = self.pending.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_into_one_trailing_publish() {
        let publisher = DebouncedPublisher::new(0u32, QUIET);
        let mut rx = publisher.subscribe();

        for value in 1..=5 {
            publisher.schedule(value);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(publisher.published_count(), 0);
        assert!(!rx.has_changed().unwrap());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(publisher.published_count(), 1);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_published_before_quiet_interval() {
        let publisher = DebouncedPublisher::new("initial", QUIET);
        publisher.schedule("next");

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(publisher.current(), "initial");

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(publisher.current(), "next");
    }

    #[tokio::test(start_paused = true)]
    async fn separated_updates_publish_separately() {
        let publisher = DebouncedPublisher::new(0u32, QUIET);

        publisher.schedule(1);
        tokio::time::sleep(Duration::from_millis(400)).await;
        publisher.schedule(2);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(publisher.published_count(), 2);
        assert_eq!(publisher.current(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_value() {
        let publisher = DebouncedPublisher::new(0u32, QUIET);
        publisher.schedule(7);
        assert!(publisher.cancel_pending());
        assert!(!publisher.cancel_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(publisher.published_count(), 0);
        assert_eq!(publisher.current(), 0);
    }
}
