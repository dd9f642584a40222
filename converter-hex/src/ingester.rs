//! Quote ingestion.
//!
//! Polls a [`PriceFeed`] on a fixed cadence, accumulates valid quotes in an
//! in-memory [`QuoteBuffer`] and periodically flushes them to the
//! [`QuoteRepository`] in one batch. A third loop enforces retention.
//!
//! All loops stop on the shared [`CancellationToken`]. The flush loop drains
//! the buffer one last time before returning.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use converter_types::{FeedError, PriceFeed, Quote, QuoteRepository, RepoError, TickerEntry};

/// Cadences and retention for the ingestion loops.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub poll_interval: Duration,
    pub flush_interval: Duration,
    pub cleanup_interval: Duration,
    pub retention_days: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            flush_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(3600),
            retention_days: 7,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Buffer
// ─────────────────────────────────────────────────────────────────────────────

/// Quotes collected since the last flush.
///
/// Appending a batch and taking the whole buffer are each a single critical
/// section, so a flush never sees half a batch and never loses one.
#[derive(Debug, Default)]
pub struct QuoteBuffer {
    quotes: Mutex<Vec<Quote>>,
}

impl QuoteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, batch: Vec<Quote>) {
        self.quotes.lock().extend(batch);
    }

    /// Swaps the contents out, leaving the buffer empty.
    pub fn take(&self) -> Vec<Quote> {
        std::mem::take(&mut *self.quotes.lock())
    }

    /// Puts a batch that failed to persist back in front of newer quotes.
    pub fn restore(&self, mut batch: Vec<Quote>) {
        let mut quotes = self.quotes.lock();
        batch.append(&mut quotes);
        *quotes = batch;
    }

    pub fn len(&self) -> usize {
        self.quotes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.lock().is_empty()
    }
}

/// Turns raw feed entries into quotes, dropping the ones that fail validation.
pub fn parse_entries(entries: Vec<TickerEntry>, observed_at: DateTime<Utc>) -> Vec<Quote> {
    entries
        .into_iter()
        .filter_map(|entry| match entry.to_quote(observed_at) {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!(?entry, "Skipping malformed ticker: {}", e);
                None
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Ingester
// ─────────────────────────────────────────────────────────────────────────────

/// Background worker feeding the quote store.
pub struct QuoteIngester<R: QuoteRepository, F: PriceFeed> {
    repo: R,
    feed: F,
    buffer: QuoteBuffer,
    config: IngestConfig,
}

impl<R: QuoteRepository, F: PriceFeed> QuoteIngester<R, F> {
    pub fn new(repo: R, feed: F, config: IngestConfig) -> Self {
        Self {
            repo,
            feed,
            buffer: QuoteBuffer::new(),
            config,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn buffer(&self) -> &QuoteBuffer {
        &self.buffer
    }

    /// Runs the poll, flush and cleanup loops until `shutdown` is cancelled.
    #[instrument(skip_all)]
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            poll_secs = self.config.poll_interval.as_secs(),
            flush_secs = self.config.flush_interval.as_secs(),
            cleanup_secs = self.config.cleanup_interval.as_secs(),
            retention_days = self.config.retention_days,
            "Quote ingester started"
        );

        tokio::join!(
            self.poll_loop(shutdown.clone()),
            self.flush_loop(shutdown.clone()),
            self.cleanup_loop(shutdown),
        );

        info!("Quote ingester stopped");
    }

    /// Fetches one snapshot from the feed and buffers every valid quote.
    pub async fn poll_once(&self) -> Result<usize, FeedError> {
        let entries = self.feed.fetch_tickers().await?;
        let quotes = parse_entries(entries, Utc::now());
        let count = quotes.len();
        self.buffer.extend(quotes);
        Ok(count)
    }

    /// Persists everything buffered so far as one batch.
    ///
    /// On failure the batch goes back into the buffer for the next attempt.
    pub async fn flush(&self) -> Result<usize, RepoError> {
        let batch = self.buffer.take();
        if batch.is_empty() {
            return Ok(0);
        }

        match self.repo.save_quotes(&batch).await {
            Ok(()) => Ok(batch.len()),
            Err(e) => {
                self.buffer.restore(batch);
                Err(e)
            }
        }
    }

    /// Deletes quotes older than the retention period.
    pub async fn cleanup(&self) -> Result<u64, RepoError> {
        self.repo.delete_older_than(self.config.retention_days).await
    }

    async fn poll_loop(&self, shutdown: CancellationToken) {
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = self.poll_once() => match result {
                    Ok(count) => debug!("Buffered {} quotes", count),
                    Err(e) => error!("Quote poll failed, retrying on next tick: {}", e),
                },
            }
        }

        debug!("Poll loop stopped");
    }

    async fn flush_loop(&self, shutdown: CancellationToken) {
        let period = self.config.flush_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.flush_logged().await,
            }
        }

        info!("Flushing remaining quotes before shutdown");
        self.flush_logged().await;
    }

    async fn flush_logged(&self) {
        match self.flush().await {
            Ok(0) => debug!("No quotes to flush"),
            Ok(count) => debug!("Flushed {} quotes", count),
            Err(e) => error!(
                pending = self.buffer.len(),
                "Failed to flush quotes: {}", e
            ),
        }
    }

    async fn cleanup_loop(&self, shutdown: CancellationToken) {
        let period = self.config.cleanup_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.cleanup().await {
                        error!("Retention sweep failed: {}", e);
                    }
                }
            }
        }

        debug!("Cleanup loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use converter_types::Symbol;

    use super::*;
    use crate::service_tests::tests::MockRepo;

    /// Feed replaying scripted responses, then repeating the fallback.
    struct MockFeed {
        script: std::sync::Mutex<VecDeque<Result<Vec<TickerEntry>, FeedError>>>,
        fallback: Vec<TickerEntry>,
        calls: AtomicUsize,
    }

    impl MockFeed {
        fn new(fallback: Vec<TickerEntry>) -> Self {
            Self {
                script: std::sync::Mutex::new(VecDeque::new()),
                fallback,
                calls: AtomicUsize::new(0),
            }
        }

        fn then(self, response: Result<Vec<TickerEntry>, FeedError>) -> Self {
            self.script.lock().unwrap().push_back(response);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceFeed for MockFeed {
        async fn fetch_tickers(&self) -> Result<Vec<TickerEntry>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(response) => response,
                None => Ok(self.fallback.clone()),
            }
        }
    }

    fn two_tickers() -> Vec<TickerEntry> {
        vec![
            TickerEntry::new("BTCUSDT", "45000.00"),
            TickerEntry::new("ETHUSDT", 3000.0),
        ]
    }

    fn config() -> IngestConfig {
        IngestConfig {
            poll_interval: Duration::from_secs(10),
            flush_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(3600),
            retention_days: 7,
        }
    }

    fn quote(symbol: &str) -> Quote {
        Quote::new(Symbol::parse(symbol).unwrap(), 1.0, Utc::now()).unwrap()
    }

    #[test]
    fn test_parse_entries_drops_malformed() {
        let entries = vec![
            TickerEntry::new("BTCUSDT", "45000.00"),
            TickerEntry::new("ETHUSDT", "not-a-number"),
            TickerEntry::new("ADAUSDT", "0"),
            TickerEntry::new("", "1.0"),
            TickerEntry::default(),
            TickerEntry::new("BNBUSDT", 400.0),
        ];

        let quotes = parse_entries(entries, Utc::now());

        let symbols: Vec<&str> = quotes.iter().map(|q| q.symbol().as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "BNBUSDT"]);
    }

    #[test]
    fn test_buffer_take_empties() {
        let buffer = QuoteBuffer::new();
        buffer.extend(vec![quote("BTCUSDT"), quote("ETHUSDT")]);

        assert_eq!(buffer.take().len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn test_buffer_restore_keeps_order() {
        let buffer = QuoteBuffer::new();
        buffer.extend(vec![quote("ADAUSDT")]);

        buffer.restore(vec![quote("BTCUSDT"), quote("ETHUSDT")]);

        let symbols: Vec<String> = buffer
            .take()
            .iter()
            .map(|q| q.symbol().to_string())
            .collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "ADAUSDT"]);
    }

    #[test]
    fn test_buffer_concurrent_extend_and_take_loses_nothing() {
        let buffer = Arc::new(QuoteBuffer::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = buffer.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        buffer.extend(vec![quote("BTCUSDT"), quote("ETHUSDT")]);
                    }
                })
            })
            .collect();

        let mut drained = 0;
        while writers.iter().any(|w| !w.is_finished()) {
            let batch = buffer.take();
            // Batches are appended atomically.
            assert_eq!(batch.len() % 2, 0);
            drained += batch.len();
        }
        for writer in writers {
            writer.join().unwrap();
        }
        drained += buffer.take().len();

        assert_eq!(drained, 4 * 250 * 2);
    }

    #[tokio::test]
    async fn test_poll_once_buffers_valid_quotes() {
        let feed = MockFeed::new(vec![
            TickerEntry::new("BTCUSDT", "45000.00"),
            TickerEntry::new("ETHUSDT", "garbage"),
        ]);
        let ingester = QuoteIngester::new(MockRepo::new(), feed, config());

        let count = ingester.poll_once().await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(ingester.buffer().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_once_failure_leaves_buffer_untouched() {
        let feed = MockFeed::new(two_tickers()).then(Err(FeedError::Status(503)));
        let ingester = QuoteIngester::new(MockRepo::new(), feed, config());

        assert!(ingester.poll_once().await.is_err());
        assert!(ingester.buffer().is_empty());
    }

    #[tokio::test]
    async fn test_flush_persists_and_clears() {
        let ingester = QuoteIngester::new(MockRepo::new(), MockFeed::new(two_tickers()), config());
        ingester.poll_once().await.unwrap();

        let flushed = ingester.flush().await.unwrap();

        assert_eq!(flushed, 2);
        assert!(ingester.buffer().is_empty());
        assert_eq!(ingester.repo().saved().len(), 2);
        assert_eq!(ingester.repo().save_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_flush_skips_store() {
        let ingester = QuoteIngester::new(MockRepo::new(), MockFeed::new(vec![]), config());

        assert_eq!(ingester.flush().await.unwrap(), 0);
        assert_eq!(ingester.repo().save_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_batch_for_retry() {
        let ingester = QuoteIngester::new(
            MockRepo::failing(),
            MockFeed::new(two_tickers()),
            config(),
        );
        ingester.poll_once().await.unwrap();

        assert!(ingester.flush().await.is_err());
        assert_eq!(ingester.buffer().len(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_uses_retention_days() {
        let mut cfg = config();
        cfg.retention_days = 3;
        let ingester = QuoteIngester::new(MockRepo::new(), MockFeed::new(vec![]), cfg);

        ingester.cleanup().await.unwrap();

        assert_eq!(ingester.repo().retention_requests(), vec![3]);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loops (paused clock)
    // ─────────────────────────────────────────────────────────────────────────

    fn spawn_run(
        ingester: &Arc<QuoteIngester<MockRepo, MockFeed>>,
        shutdown: &CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let ingester = ingester.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { ingester.run(shutdown).await })
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_buffered_quotes() {
        let ingester = Arc::new(QuoteIngester::new(
            MockRepo::new(),
            MockFeed::new(two_tickers()),
            config(),
        ));
        let shutdown = CancellationToken::new();
        let handle = spawn_run(&ingester, &shutdown);

        // First poll fires immediately; the first flush is 30s away.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ingester.repo().save_calls(), 0);

        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(ingester.repo().saved().len(), 2);
        assert!(ingester.buffer().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_does_not_stop_loop() {
        let feed = MockFeed::new(two_tickers()).then(Err(FeedError::Unavailable("reset".into())));
        let ingester = Arc::new(QuoteIngester::new(MockRepo::new(), feed, config()));
        let shutdown = CancellationToken::new();
        let handle = spawn_run(&ingester, &shutdown);

        // Polls at 0s (fails), 10s and 20s.
        tokio::time::sleep(Duration::from_secs(25)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let feed_calls = ingester.feed.calls();
        assert!(feed_calls >= 3);
        assert_eq!(ingester.repo().saved().len(), (feed_calls - 1) * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failures_do_not_stop_polling() {
        let mut cfg = config();
        cfg.cleanup_interval = Duration::from_secs(60);
        let ingester = Arc::new(QuoteIngester::new(
            MockRepo::failing(),
            MockFeed::new(two_tickers()),
            cfg,
        ));
        let shutdown = CancellationToken::new();
        let handle = spawn_run(&ingester, &shutdown);

        // Flushes at 30s, 60s and 90s fail, as does the cleanup at 60s.
        tokio::time::sleep(Duration::from_secs(95)).await;

        let feed_calls = ingester.feed.calls();
        assert!(feed_calls >= 9);
        assert!(ingester.repo().save_calls() >= 3);
        assert!(ingester.repo().saved().is_empty());
        assert_eq!(ingester.buffer().len(), feed_calls * 2);

        shutdown.cancel();
        handle.await.unwrap();

        // The final flush fails too, so nothing polled is lost.
        assert!(ingester.repo().save_calls() >= 4);
        assert_eq!(ingester.buffer().len(), ingester.feed.calls() * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_flush_and_cleanup() {
        let mut cfg = config();
        cfg.cleanup_interval = Duration::from_secs(60);
        let ingester = Arc::new(QuoteIngester::new(
            MockRepo::new(),
            MockFeed::new(two_tickers()),
            cfg,
        ));
        let shutdown = CancellationToken::new();
        let handle = spawn_run(&ingester, &shutdown);

        tokio::time::sleep(Duration::from_secs(65)).await;
        assert!(ingester.repo().save_calls() >= 2);
        assert_eq!(ingester.repo().retention_requests(), vec![7]);

        shutdown.cancel();
        handle.await.unwrap();

        // Every polled quote ends up stored exactly once.
        assert_eq!(ingester.repo().saved().len(), ingester.feed.calls() * 2);
    }
}
