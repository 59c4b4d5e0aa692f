//! Paginated viewer over the preview dataset.
//!
//! Owns current page, page size, and total-row bookkeeping. The backend is
//! the source of truth for pagination bounds: navigation enablement is
//! recomputed from every fresh response, never from a stale local count.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::gateway::{BackendGateway, GatewayError, ResultSet};
use crate::sink::SinkHandle;

/// Per-request load state. `Loading` rejects overlapping navigation; a
/// navigation click while a load is in flight is ignored, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
}

struct ViewerState {
    phase: LoadPhase,
    current_page: u32,
    total_rows: u64,
}

fn has_next_page(page: u32, page_size: u32, total_rows: u64) -> bool {
    (page as u64) * (page_size as u64) < total_rows
}

fn has_previous_page(page: u32) -> bool {
    page > 1
}

/// Viewer translating navigation intents into gateway page fetches.
pub struct PageViewer {
    gateway: Arc<dyn BackendGateway>,
    sink: SinkHandle,
    page_size: u32,
    state: Mutex<ViewerState>,
}

impl PageViewer {
    /// Create a viewer with a fixed page size (> 0, validated by config).
    pub fn new(gateway: Arc<dyn BackendGateway>, sink: SinkHandle, page_size: u32) -> Self {
        assert!(page_size > 0, "page_size must be greater than zero");
        Self {
            gateway,
            sink,
            page_size,
            state: Mutex::new(ViewerState {
                phase: LoadPhase::Idle,
                current_page: 1,
                total_rows: 0,
            }),
        }
    }

    /// Load and render one page. Overlapping requests are ignored while a
    /// load is in flight. Page and total are adopted from the response.
    pub async fn load_page(&self, page: u32) {
        let page = page.max(1);
        {
            let mut state = self.state.lock().expect("viewer state lock poisoned");
            if state.phase == LoadPhase::Loading {
                debug!("Page load in flight, ignoring request for page {}", page);
                return;
            }
            state.phase = LoadPhase::Loading;
        }

        self.sink.set_status(&format!("Loading page {}...", page));
        let fetched = self.gateway.fetch_page(page, self.page_size).await;

        match fetched {
            Ok(slice) if slice.total == 0 || slice.rows.is_empty() => {
                {
                    let mut state = self.state.lock().expect("viewer state lock poisoned");
                    state.phase = LoadPhase::Loaded;
                    state.current_page = 1;
                    state.total_rows = 0;
                }
                self.sink.render_no_data();
                self.sink.set_navigation(false, false);
                self.sink.set_status("No data");
            }
            Ok(slice) => {
                let (current, total) = {
                    let mut state = self.state.lock().expect("viewer state lock poisoned");
                    state.phase = LoadPhase::Loaded;
                    state.current_page = slice.page.max(1);
                    state.total_rows = slice.total;
                    (state.current_page, state.total_rows)
                };
                let result = ResultSet::from_rows(slice.rows);
                self.sink.render(&result);
                self.sink.set_navigation(
                    has_previous_page(current),
                    has_next_page(current, self.page_size, total),
                );
                self.sink.set_status(&format!(
                    "Page {}: {} of {} rows",
                    current,
                    result.row_count(),
                    total
                ));
            }
            Err(e) => {
                {
                    let mut state = self.state.lock().expect("viewer state lock poisoned");
                    state.phase = LoadPhase::Idle;
                }
                warn!("Page {} load failed: {}", page, e);
                self.sink.set_status(&format!("Error: {}", e));
            }
        }
    }

    /// Advance one page. No-op at the last page or while a load is in
    /// flight.
    pub async fn next(&self) {
        let target = {
            let state = self.state.lock().expect("viewer state lock poisoned");
            if state.phase == LoadPhase::Loading {
                debug!("Page load in flight, ignoring next()");
                return;
            }
            if !has_next_page(state.current_page, self.page_size, state.total_rows) {
                debug!("Already at the last page");
                return;
            }
            state.current_page + 1
        };
        self.load_page(target).await;
    }

    /// Go back one page. No-op at page 1 or while a load is in flight.
    pub async fn previous(&self) {
        let target = {
            let state = self.state.lock().expect("viewer state lock poisoned");
            if state.phase == LoadPhase::Loading {
                debug!("Page load in flight, ignoring previous()");
                return;
            }
            if !has_previous_page(state.current_page) {
                debug!("Already at the first page");
                return;
            }
            state.current_page - 1
        };
        self.load_page(target).await;
    }

    pub fn current_page(&self) -> u32 {
        self.state.lock().expect("viewer state lock poisoned").current_page
    }

    pub fn total_rows(&self) -> u64 {
        self.state.lock().expect("viewer state lock poisoned").total_rows
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.lock().expect("viewer state lock poisoned").phase
    }

    pub fn has_next(&self) -> bool {
        let state = self.state.lock().expect("viewer state lock poisoned");
        has_next_page(state.current_page, self.page_size, state.total_rows)
    }

    pub fn has_previous(&self) -> bool {
        let state = self.state.lock().expect("viewer state lock poisoned");
        has_previous_page(state.current_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{PageSlice, Row};
    use crate::sink::testkit::{RecordingSink, SinkEvent};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn make_rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| {
                json!({"symbol": format!("SYM{}", i), "strike": 100 + i})
                    .as_object()
                    .unwrap()
                    .clone()
            })
            .collect()
    }

    /// Gateway double serving pages of a fixed-size dataset; per-call totals
    /// can be scripted to simulate server-side dataset changes.
    struct PagedGateway {
        total: u64,
        totals_script: Mutex<VecDeque<u64>>,
        calls: Mutex<Vec<(u32, u32)>>,
    }

    impl PagedGateway {
        fn new(total: u64) -> Self {
            Self {
                total,
                totals_script: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_totals(self, totals: Vec<u64>) -> Self {
            *self.totals_script.lock().unwrap() = totals.into();
            self
        }

        fn calls(&self) -> Vec<(u32, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BackendGateway for PagedGateway {
        async fn run_computation(&self) -> Result<Value, GatewayError> {
            unreachable!("viewer never runs computations")
        }

        async fn run_refresh(&self) -> Result<ResultSet, GatewayError> {
            unreachable!("viewer never runs refreshes")
        }

        async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageSlice, GatewayError> {
            self.calls.lock().unwrap().push((page, page_size));
            let total = self
                .totals_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.total);
            let start = (page as u64 - 1) * page_size as u64;
            let count = (total.saturating_sub(start)).min(page_size as u64) as usize;
            Ok(PageSlice {
                rows: make_rows(count),
                total,
                page,
            })
        }

        async fn export_dataset(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn create_viewer(gateway: Arc<PagedGateway>, page_size: u32) -> (PageViewer, RecordingSink) {
        let sink = RecordingSink::new();
        let viewer = PageViewer::new(gateway, sink.handle(), page_size);
        (viewer, sink)
    }

    #[test]
    fn test_bounds_predicates() {
        // totalRows = 450, pageSize = 200: page 3 is the last page.
        assert!(has_next_page(1, 200, 450));
        assert!(has_next_page(2, 200, 450));
        assert!(!has_next_page(3, 200, 450));
        assert!(!has_previous_page(1));
        assert!(has_previous_page(2));
    }

    #[tokio::test]
    async fn test_load_page_adopts_backend_totals() {
        let gateway = Arc::new(PagedGateway::new(450));
        let (viewer, sink) = create_viewer(gateway.clone(), 200);

        viewer.load_page(1).await;

        assert_eq!(viewer.current_page(), 1);
        assert_eq!(viewer.total_rows(), 450);
        assert_eq!(viewer.phase(), LoadPhase::Loaded);
        assert_eq!(gateway.calls(), vec![(1, 200)]);
        assert_eq!(sink.last_navigation(), Some((false, true)));
        assert!(sink.events().contains(&SinkEvent::Render {
            rows: 200,
            columns: vec!["symbol".to_string(), "strike".to_string()],
        }));
        assert!(sink
            .statuses()
            .contains(&"Page 1: 200 of 450 rows".to_string()));
    }

    #[tokio::test]
    async fn test_next_is_noop_at_last_page() {
        let gateway = Arc::new(PagedGateway::new(450));
        let (viewer, sink) = create_viewer(gateway.clone(), 200);

        viewer.load_page(3).await;
        assert_eq!(viewer.current_page(), 3);
        assert!(!viewer.has_next());
        assert_eq!(sink.last_navigation(), Some((true, false)));

        viewer.next().await;

        // 3 * 200 >= 450: no fetch happened.
        assert_eq!(gateway.calls(), vec![(3, 200)]);
        assert_eq!(viewer.current_page(), 3);
    }

    #[tokio::test]
    async fn test_previous_is_noop_at_first_page() {
        let gateway = Arc::new(PagedGateway::new(450));
        let (viewer, _sink) = create_viewer(gateway.clone(), 200);

        viewer.load_page(1).await;
        assert!(!viewer.has_previous());

        viewer.previous().await;

        assert_eq!(gateway.calls(), vec![(1, 200)]);
        assert_eq!(viewer.current_page(), 1);
    }

    #[tokio::test]
    async fn test_next_and_previous_navigate() {
        let gateway = Arc::new(PagedGateway::new(450));
        let (viewer, _sink) = create_viewer(gateway.clone(), 200);

        viewer.load_page(1).await;
        viewer.next().await;
        assert_eq!(viewer.current_page(), 2);
        viewer.previous().await;
        assert_eq!(viewer.current_page(), 1);

        assert_eq!(gateway.calls(), vec![(1, 200), (2, 200), (1, 200)]);
    }

    #[tokio::test]
    async fn test_empty_result_disables_navigation() {
        let gateway = Arc::new(PagedGateway::new(0));
        let (viewer, sink) = create_viewer(gateway, 200);

        viewer.load_page(1).await;

        assert!(sink.events().contains(&SinkEvent::NoData));
        assert_eq!(sink.last_navigation(), Some((false, false)));
        assert!(sink.statuses().contains(&"No data".to_string()));
        assert_eq!(viewer.current_page(), 1);
        assert_eq!(viewer.total_rows(), 0);
        assert!(!viewer.has_next());
        assert!(!viewer.has_previous());
    }

    #[tokio::test]
    async fn test_navigation_recomputed_from_fresh_total() {
        // The dataset shrinks between fetches: enablement must follow the
        // freshly returned total, not the remembered one.
        let gateway = Arc::new(PagedGateway::new(450).with_totals(vec![450, 410]));
        let (viewer, sink) = create_viewer(gateway.clone(), 200);

        viewer.load_page(2).await;
        assert!(viewer.has_next());

        viewer.next().await;
        assert_eq!(viewer.current_page(), 3);
        assert_eq!(viewer.total_rows(), 410);
        assert!(!viewer.has_next());
        assert_eq!(sink.last_navigation(), Some((true, false)));

        viewer.next().await;
        assert_eq!(gateway.calls().len(), 2);
    }

    /// Gateway double that parks every fetch until released.
    struct BlockingGateway {
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BackendGateway for BlockingGateway {
        async fn run_computation(&self) -> Result<Value, GatewayError> {
            unreachable!()
        }

        async fn run_refresh(&self) -> Result<ResultSet, GatewayError> {
            unreachable!()
        }

        async fn fetch_page(&self, page: u32, _page_size: u32) -> Result<PageSlice, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(PageSlice {
                rows: make_rows(1),
                total: 10,
                page,
            })
        }

        async fn export_dataset(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_navigation_while_loading_is_ignored() {
        let gateway = Arc::new(BlockingGateway {
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let sink = RecordingSink::new();
        let viewer = Arc::new(PageViewer::new(
            gateway.clone() as Arc<dyn BackendGateway>,
            sink.handle(),
            5,
        ));

        let in_flight = {
            let viewer = Arc::clone(&viewer);
            tokio::spawn(async move { viewer.load_page(1).await })
        };

        // Let the load reach the gateway and park there.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(viewer.phase(), LoadPhase::Loading);

        // Clicks during a load are dropped, not queued.
        viewer.next().await;
        viewer.previous().await;
        viewer.load_page(2).await;
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        gateway.release.notify_one();
        in_flight.await.unwrap();

        assert_eq!(viewer.current_page(), 1);
        assert_eq!(viewer.phase(), LoadPhase::Loaded);
    }

    /// Gateway double failing the first fetch only.
    struct FlakyGateway {
        inner: PagedGateway,
        failed_once: AtomicBool,
    }

    #[async_trait]
    impl BackendGateway for FlakyGateway {
        async fn run_computation(&self) -> Result<Value, GatewayError> {
            unreachable!()
        }

        async fn run_refresh(&self) -> Result<ResultSet, GatewayError> {
            unreachable!()
        }

        async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageSlice, GatewayError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(GatewayError::Transport("connection reset".to_string()));
            }
            self.inner.fetch_page(page, page_size).await
        }

        async fn export_dataset(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_load_failure_allows_retry() {
        let gateway = Arc::new(FlakyGateway {
            inner: PagedGateway::new(10),
            failed_once: AtomicBool::new(false),
        });
        let sink = RecordingSink::new();
        let viewer = PageViewer::new(gateway, sink.handle(), 5);

        viewer.load_page(1).await;

        assert_eq!(viewer.phase(), LoadPhase::Idle);
        assert!(sink
            .statuses()
            .iter()
            .any(|s| s.starts_with("Error: ") && s.contains("connection reset")));

        viewer.load_page(1).await;

        assert_eq!(viewer.phase(), LoadPhase::Loaded);
        assert_eq!(viewer.total_rows(), 10);
    }
}
