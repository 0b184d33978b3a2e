use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tornwatch_api_client::{FetchOutcome, TornClient};
use tornwatch_core::{extract_target_id, is_attack_page, time_ago, TargetId};

use crate::config;
use crate::credential;
use crate::overlay::{Overlay, StatusLine};
use crate::page_source::{PageContext, PageFile, StaticPage};

const PLACEHOLDER: &str = "Last action: ...";

/// Async seam over the last-action fetch so lifecycle tests can stub the
/// network away.
pub trait LastActionFetcher {
    async fn fetch_last_action(&self, target: &TargetId, api_key: &str) -> Result<FetchOutcome>;
}

impl LastActionFetcher for TornClient {
    async fn fetch_last_action(&self, target: &TargetId, api_key: &str) -> Result<FetchOutcome> {
        TornClient::fetch_last_action(self, target, api_key).await
    }
}

/// Owns the overlay and the poll cadence.
///
/// Lifecycle: `run` guards eligibility (Idle), mounts the overlay and polls
/// until the shutdown signal flips (Active), then clears the overlay and
/// returns (Terminated). Target id and API key are re-resolved on every
/// tick; only the key *acquisition* (interactive prompt) is the caller's
/// one-time job before `run`.
pub struct OverlayController<P, F, O, K> {
    page: P,
    fetcher: F,
    overlay: O,
    read_key: K,
    interval: Duration,
}

impl<P, F, O, K> OverlayController<P, F, O, K>
where
    P: PageContext,
    F: LastActionFetcher,
    O: Overlay,
    K: Fn() -> Option<String>,
{
    pub fn new(page: P, fetcher: F, overlay: O, read_key: K, interval: Duration) -> Self {
        Self {
            page,
            fetcher,
            overlay,
            read_key,
            interval,
        }
    }

    /// Run the overlay until `shutdown` flips to true.
    ///
    /// Stays down (no overlay, no polling) when the page is not an attack
    /// page, has no target id, or no API key is readable.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let Some(url) = self.page.current_url() else {
            debug!("No page context available; overlay stays down");
            return;
        };
        if !is_attack_page(&url) {
            debug!("Not an attack page; overlay stays down");
            return;
        }
        if extract_target_id(&url).is_none() {
            debug!("No target id in URL; overlay stays down");
            return;
        }
        if (self.read_key)().is_none() {
            info!("No API key available; overlay stays down");
            return;
        }

        self.overlay.show(PLACEHOLDER);
        self.poll().await;

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial poll above
        // already covered it.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => self.poll().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("Shutdown signal received, stopping overlay");
                        break;
                    }
                }
            }
        }

        self.overlay.clear();
    }

    /// One poll tick. Never fails: every failure path degrades to a
    /// diagnostic overlay message and a log line.
    async fn poll(&mut self) {
        let Some(url) = self.page.current_url() else {
            self.overlay.show("Last action: page unavailable");
            return;
        };
        if !is_attack_page(&url) {
            self.overlay.show("Last action: not an attack page");
            return;
        }
        let Some(target) = extract_target_id(&url) else {
            self.overlay.show("Last action: no target on this page");
            return;
        };
        let Some(api_key) = (self.read_key)() else {
            self.overlay.show("Last action: API key not set");
            return;
        };

        match self.fetcher.fetch_last_action(&target, &api_key).await {
            Ok(FetchOutcome::LastAction(ts)) => {
                self.overlay.show(&format!("Last action: {} ago", time_ago(ts)));
            }
            Ok(FetchOutcome::ApiError(msg)) => {
                warn!("Torn API error for target {target}: {msg}");
                self.overlay.show(&format!("Last action: API error: {msg}"));
            }
            Ok(FetchOutcome::NoData) => {
                self.overlay.show("Last action: no data available");
            }
            Err(e) => {
                warn!("Last-action fetch for target {target} failed: {e:#}");
                self.overlay.show("Last action: network error");
            }
        }
    }
}

/// Entry point for `tornwatch watch`.
pub async fn run_watch(
    url: Option<String>,
    url_file: Option<PathBuf>,
    interval_override: Option<u64>,
) -> Result<()> {
    let cfg = config::load_config()?;

    let interval_secs = interval_override.unwrap_or(cfg.poll.interval_secs);
    anyhow::ensure!(interval_secs > 0, "interval must be positive");

    let page: Box<dyn PageContext> = match (url, url_file) {
        (Some(url), None) => Box::new(StaticPage::new(url)),
        (None, Some(path)) => Box::new(PageFile::new(path)),
        _ => anyhow::bail!("provide either a URL or --url-file"),
    };

    // Acquire the API key once, up front, and only if the page would be
    // eligible at all. Poll ticks below do pure reads; a declined prompt is
    // never repeated on the timer.
    if let Some(url) = page.current_url() {
        if is_attack_page(&url)
            && extract_target_id(&url).is_some()
            && credential::acquire_api_key()?.is_none()
        {
            info!("No API key provided; nothing to watch");
            return Ok(());
        }
    }

    let fetcher = TornClient::new(
        &cfg.server.url,
        Duration::from_secs(cfg.poll.request_timeout_secs),
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown().await;
        let _ = shutdown_tx.send(true);
    });

    let controller = OverlayController::new(
        page,
        fetcher,
        StatusLine::new(),
        || credential::stored_api_key().ok().flatten(),
        Duration::from_secs(interval_secs),
    );
    controller.run(shutdown_rx).await;

    Ok(())
}

/// Wait for SIGTERM or SIGINT.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => debug!("Received SIGTERM"),
            _ = sigint.recv() => debug!("Received SIGINT"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register Ctrl+C handler");
        debug!("Received Ctrl+C");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{SystemTime, UNIX_EPOCH};

    const ATTACK_URL: &str = "https://www.torn.com/loader.php?sid=attack&user2ID=12345";

    #[derive(Clone, Default)]
    struct RecordingOverlay {
        frames: Arc<Mutex<Vec<String>>>,
        cleared: Arc<AtomicUsize>,
    }

    impl RecordingOverlay {
        fn frames(&self) -> Vec<String> {
            self.frames.lock().unwrap().clone()
        }
    }

    impl Overlay for RecordingOverlay {
        fn show(&mut self, text: &str) {
            self.frames.lock().unwrap().push(text.to_string());
        }

        fn clear(&mut self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Clone)]
    struct StubFetcher {
        calls: Arc<AtomicUsize>,
        outcome: Option<FetchOutcome>,
    }

    impl StubFetcher {
        fn ok(outcome: FetchOutcome) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                outcome: Some(outcome),
            }
        }

        fn failing() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                outcome: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LastActionFetcher for StubFetcher {
        async fn fetch_last_action(
            &self,
            _target: &TargetId,
            _api_key: &str,
        ) -> Result<FetchOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Some(outcome) => Ok(outcome.clone()),
                None => Err(anyhow::anyhow!("connection refused")),
            }
        }
    }

    fn epoch_now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_secs() as i64
    }

    fn some_key() -> Option<String> {
        Some("test-key".to_string())
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..10_000 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test(start_paused = true)]
    async fn ineligible_page_stays_idle() {
        let overlay = RecordingOverlay::default();
        let fetcher = StubFetcher::ok(FetchOutcome::NoData);
        let (_tx, rx) = watch::channel(false);

        let controller = OverlayController::new(
            StaticPage::new("https://www.torn.com/index.php"),
            fetcher.clone(),
            overlay.clone(),
            some_key,
            Duration::from_secs(10),
        );
        controller.run(rx).await;

        assert!(overlay.frames().is_empty());
        assert_eq!(overlay.cleared.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_target_or_key_stays_idle() {
        let overlay = RecordingOverlay::default();
        let fetcher = StubFetcher::ok(FetchOutcome::NoData);

        let (_tx, rx) = watch::channel(false);
        let controller = OverlayController::new(
            StaticPage::new("https://www.torn.com/loader.php?sid=attack"),
            fetcher.clone(),
            overlay.clone(),
            some_key,
            Duration::from_secs(10),
        );
        controller.run(rx).await;
        assert!(overlay.frames().is_empty());

        let (_tx, rx) = watch::channel(false);
        let controller = OverlayController::new(
            StaticPage::new(ATTACK_URL),
            fetcher.clone(),
            overlay.clone(),
            || None,
            Duration::from_secs(10),
        );
        controller.run(rx).await;

        assert!(overlay.frames().is_empty());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_mounts_polls_and_cleans_up() {
        let overlay = RecordingOverlay::default();
        let fetcher = StubFetcher::ok(FetchOutcome::LastAction(epoch_now() - 120));
        let (tx, rx) = watch::channel(false);

        let controller = OverlayController::new(
            StaticPage::new(ATTACK_URL),
            fetcher.clone(),
            overlay.clone(),
            some_key,
            Duration::from_secs(10),
        );
        let handle = tokio::spawn(controller.run(rx));

        let calls = fetcher.calls.clone();
        wait_until(|| calls.load(Ordering::SeqCst) >= 3).await;

        tx.send(true).expect("send shutdown");
        handle.await.expect("controller task");

        let frames = overlay.frames();
        assert_eq!(frames[0], PLACEHOLDER);
        // Exactly one mount: the placeholder appears exactly once.
        assert_eq!(frames.iter().filter(|f| *f == PLACEHOLDER).count(), 1);
        assert!(
            frames.iter().any(|f| f == "Last action: 2 minutes ago"),
            "no formatted frame in {frames:?}"
        );
        assert_eq!(overlay.cleared.load(Ordering::SeqCst), 1);

        // No further polls after cleanup.
        let calls_at_shutdown = fetcher.calls();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.calls(), calls_at_shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_target_shows_diagnostic_without_teardown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("current-url");
        std::fs::write(&path, ATTACK_URL).expect("write url");

        let overlay = RecordingOverlay::default();
        let fetcher = StubFetcher::ok(FetchOutcome::LastAction(epoch_now() - 30));
        let (tx, rx) = watch::channel(false);

        let controller = OverlayController::new(
            PageFile::new(path.clone()),
            fetcher.clone(),
            overlay.clone(),
            some_key,
            Duration::from_secs(10),
        );
        let handle = tokio::spawn(controller.run(rx));

        let calls = fetcher.calls.clone();
        wait_until(|| calls.load(Ordering::SeqCst) >= 1).await;

        std::fs::write(&path, "https://www.torn.com/loader.php?sid=attack").expect("rewrite url");
        let frames = overlay.frames.clone();
        wait_until(move || {
            frames
                .lock()
                .unwrap()
                .iter()
                .any(|f| f == "Last action: no target on this page")
        })
        .await;

        // Still Active: diagnostic shown in place, overlay not torn down.
        assert_eq!(overlay.cleared.load(Ordering::SeqCst), 0);

        tx.send(true).expect("send shutdown");
        handle.await.expect("controller task");
        assert_eq!(overlay.cleared.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn key_removed_mid_run_shows_diagnostic() {
        let overlay = RecordingOverlay::default();
        let fetcher = StubFetcher::ok(FetchOutcome::LastAction(epoch_now() - 30));
        let (tx, rx) = watch::channel(false);

        let reads = Arc::new(AtomicUsize::new(0));
        let read_counter = reads.clone();
        let read_key = move || {
            // Key present for the startup guard and the first poll, then gone.
            if read_counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Some("test-key".to_string())
            } else {
                None
            }
        };

        let controller = OverlayController::new(
            StaticPage::new(ATTACK_URL),
            fetcher.clone(),
            overlay.clone(),
            read_key,
            Duration::from_secs(10),
        );
        let handle = tokio::spawn(controller.run(rx));

        let frames = overlay.frames.clone();
        wait_until(move || {
            frames
                .lock()
                .unwrap()
                .iter()
                .any(|f| f == "Last action: API key not set")
        })
        .await;

        tx.send(true).expect("send shutdown");
        handle.await.expect("controller task");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn poll_maps_outcomes_to_overlay_text() {
        let cases = vec![
            (
                StubFetcher::ok(FetchOutcome::ApiError("Incorrect key".to_string())),
                "Last action: API error: Incorrect key",
            ),
            (
                StubFetcher::ok(FetchOutcome::NoData),
                "Last action: no data available",
            ),
            (StubFetcher::failing(), "Last action: network error"),
        ];

        for (fetcher, want) in cases {
            let overlay = RecordingOverlay::default();
            let mut controller = OverlayController::new(
                StaticPage::new(ATTACK_URL),
                fetcher,
                overlay.clone(),
                some_key,
                Duration::from_secs(10),
            );
            controller.poll().await;
            assert_eq!(overlay.frames().last().map(String::as_str), Some(want));
        }
    }
}
