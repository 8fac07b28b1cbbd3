//! Temporary build-validation diagnostic. Not part of the suite; deleted
//! before finishing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use apteka_core::{Page, RawItem};
use apteka_db::Database;
use apteka_sync::error::SyncResult;
use apteka_sync::{FixedCredentials, PageSource, Scheduler, SyncOrchestrator};
use async_trait::async_trait;
use chrono::Utc;

struct CountingSource {
    page: Page,
    calls: Mutex<Vec<u32>>,
}

impl CountingSource {
    fn single_page() -> Self {
        let item = RawItem {
            id: Some("A".to_string()),
            product: Some("Item A".to_string()),
            supplier: Some("Acme".to_string()),
            quantity: 1.0,
            sale_price: 10.0,
            ..RawItem::default()
        };
        Self {
            page: Page {
                items: vec![item],
                total_pages: 1,
                total_count: 1,
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSource for CountingSource {
    async fn fetch_page(&self, page_number: u32) -> SyncResult<Page> {
        self.calls.lock().unwrap().push(page_number);
        Ok(self.page.clone())
    }
}

#[tokio::test]
async fn diag_startup_flake_hunt() {
    let interval = Duration::from_secs(600);
    let db = Arc::new(Database::in_memory().await.unwrap());
    let source = Arc::new(CountingSource::single_page());
    let orchestrator = Arc::new(
        SyncOrchestrator::new(db.clone(), source.clone())
            .with_credentials(Arc::new(FixedCredentials::new("pw12345x")))
            .with_page_delay(Duration::ZERO)
            .with_sync_interval(interval),
    );
    let (scheduler, handle) = Scheduler::new(orchestrator.clone(), interval);
    let task = tokio::spawn(scheduler.run());

    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    while (source.call_count() < 2 || orchestrator.is_running())
        && std::time::Instant::now() < deadline
    {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    eprintln!("PHASE1 done: calls={} running={}", source.call_count(), orchestrator.is_running());
    assert_eq!(source.call_count(), 2);

    let t0 = tokio::time::Instant::now();
    tokio::time::pause();
    eprintln!("after pause: vt={:?}", t0.elapsed());
    tokio::task::yield_now().await;
    eprintln!("after yield: vt={:?}", t0.elapsed());
    tokio::time::advance(Duration::from_secs(601)).await;
    eprintln!("after advance: vt={:?}", t0.elapsed());
    tokio::time::resume();
    eprintln!("after resume: vt={:?}", t0.elapsed());
    // Short cap: we only want to know whether the incremental happened.
    let deadline = std::time::Instant::now() + Duration::from_secs(3);
    while source.call_count() < 3 && std::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let count = source.call_count();
    eprintln!("PHASE2 done: calls={count} vt={:?}", t0.elapsed());
    if count < 3 {
        eprintln!("FLAKE REPRODUCED");
        eprintln!("is_running={}", orchestrator.is_running());
        // Probe whether the select's shutdown arm is still alive.
        let sd_start = std::time::Instant::now();
        handle.shutdown().await;
        match tokio::time::timeout(Duration::from_secs(2), task).await {
            Ok(join) => eprintln!(
                "scheduler task ended after shutdown in {:?}: {join:?}",
                sd_start.elapsed()
            ),
            Err(_) => eprintln!("scheduler task DID NOT end within 2s of shutdown"),
        }
        eprintln!("calls after shutdown probe: {}", source.call_count());
        panic!("flake reproduced");
    }

    handle.shutdown().await;
    task.await.unwrap();
}
