//! Bounded page cache with single-flight builds.
//!
//! Scene graphs are expensive to build, so recently built pages are
//! kept in a small FIFO cache. Concurrent requests for the same page
//! coalesce onto one build: the first caller inserts a building marker
//! under the lock and everyone else waits on it, so a page is never
//! built twice at once. A page that blew its processing budget is
//! remembered as timed out and keeps failing fast until an explicit
//! [`PageCache::reload`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use log::debug;

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::scene::SceneGraph;

enum Slot {
    /// A build is in flight; waiters block on the condvar.
    Building,
    Ready(Arc<SceneGraph>),
    /// The page timed out with this budget; sticky until reload.
    TimedOut(u64),
}

struct CacheInner {
    slots: HashMap<u32, Slot>,
    /// Ready pages in insertion order; the eviction queue.
    order: VecDeque<u32>,
}

/// FIFO cache of built scene graphs, bounded by page count.
pub struct PageCache {
    inner: Mutex<CacheInner>,
    build_done: Condvar,
    capacity: usize,
}

impl PageCache {
    /// Creates an empty cache holding at most
    /// [`LayoutConfig::max_cached_pages`] pages.
    pub fn new(config: &LayoutConfig) -> Self {
        PageCache {
            inner: Mutex::new(CacheInner {
                slots: HashMap::new(),
                order: VecDeque::new(),
            }),
            build_done: Condvar::new(),
            capacity: config.max_cached_pages.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // Poisoning only marks a panic elsewhere; the slot map itself
        // stays consistent because every transition happens under the
        // lock in one step.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the cached scene graph for `page_number`, building it
    /// with `build` on a miss.
    ///
    /// At most one build runs per page at a time. A timed-out page
    /// returns [`Error::Timeout`] without invoking `build` again.
    pub fn get_or_build<F>(&self, page_number: u32, build: F) -> Result<Arc<SceneGraph>>
    where
        F: FnOnce() -> Result<SceneGraph>,
    {
        let mut inner = self.lock();
        loop {
            match inner.slots.get(&page_number) {
                Some(Slot::Ready(graph)) => return Ok(Arc::clone(graph)),
                Some(Slot::TimedOut(budget_ms)) => {
                    return Err(Error::Timeout {
                        page: page_number,
                        budget_ms: *budget_ms,
                    })
                }
                Some(Slot::Building) => {
                    inner = self
                        .build_done
                        .wait(inner)
                        .unwrap_or_else(|e| e.into_inner());
                }
                None => break,
            }
        }
        inner.slots.insert(page_number, Slot::Building);
        drop(inner);

        let built = build();

        let mut inner = self.lock();
        let result = match built {
            Ok(graph) => {
                let graph = Arc::new(graph);
                inner
                    .slots
                    .insert(page_number, Slot::Ready(Arc::clone(&graph)));
                inner.order.push_back(page_number);
                while inner.order.len() > self.capacity {
                    if let Some(evicted) = inner.order.pop_front() {
                        debug!("evicting page {} from cache", evicted);
                        inner.slots.remove(&evicted);
                    }
                }
                Ok(graph)
            }
            Err(err) => {
                if let Error::Timeout { budget_ms, .. } = err {
                    inner.slots.insert(page_number, Slot::TimedOut(budget_ms));
                } else {
                    inner.slots.remove(&page_number);
                }
                Err(err)
            }
        };
        drop(inner);
        self.build_done.notify_all();
        result
    }

    /// Rebuilds the page unconditionally, clearing a sticky timeout.
    ///
    /// The existing slot is dropped first, so even a ready page is built
    /// again. A build already in flight is joined instead of doubled.
    pub fn reload<F>(&self, page_number: u32, build: F) -> Result<Arc<SceneGraph>>
    where
        F: FnOnce() -> Result<SceneGraph>,
    {
        {
            let mut inner = self.lock();
            if !matches!(inner.slots.get(&page_number), Some(Slot::Building)) {
                inner.slots.remove(&page_number);
                inner.order.retain(|&p| p != page_number);
            }
        }
        self.get_or_build(page_number, build)
    }

    /// Number of ready pages held.
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    /// Whether no ready pages are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the page is cached and ready.
    pub fn contains(&self, page_number: u32) -> bool {
        matches!(self.lock().slots.get(&page_number), Some(Slot::Ready(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn graph(page: u32) -> SceneGraph {
        SceneGraph::new(page, Rect::new(0.0, 0.0, 595.0, 842.0))
    }

    fn cache(capacity: usize) -> PageCache {
        PageCache::new(&LayoutConfig::default().with_max_cached_pages(capacity))
    }

    #[test]
    fn test_hit_returns_same_graph() {
        let cache = cache(3);
        let a = cache.get_or_build(1, || Ok(graph(1))).unwrap();
        let b = cache
            .get_or_build(1, || panic!("must not rebuild a cached page"))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_fifo_eviction_drops_oldest() {
        let cache = cache(2);
        for page in 1..=3 {
            cache.get_or_build(page, || Ok(graph(page))).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert!(cache.contains(3));
    }

    #[test]
    fn test_timeout_is_sticky_until_reload() {
        let cache = cache(3);
        let err = cache
            .get_or_build(7, || {
                Err(Error::Timeout {
                    page: 7,
                    budget_ms: 60_000,
                })
            })
            .unwrap_err();
        assert!(err.is_timeout());
        // The builder must not run again while the timeout is sticky.
        let err = cache
            .get_or_build(7, || panic!("sticky timeout must fail fast"))
            .unwrap_err();
        assert!(err.is_timeout());
        let rebuilt = cache.reload(7, || Ok(graph(7))).unwrap();
        assert_eq!(rebuilt.page_number, 7);
        assert!(cache.contains(7));
    }

    #[test]
    fn test_reload_rebuilds_a_ready_page() {
        let cache = cache(3);
        let first = cache.get_or_build(4, || Ok(graph(4))).unwrap();
        let second = cache.reload(4, || Ok(graph(4))).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_other_errors_are_not_sticky() {
        let cache = cache(3);
        cache
            .get_or_build(2, || Err(Error::PageOutOfRange(2)))
            .unwrap_err();
        let rebuilt = cache.get_or_build(2, || Ok(graph(2))).unwrap();
        assert_eq!(rebuilt.page_number, 2);
    }

    #[test]
    fn test_concurrent_requests_build_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;

        let cache = Arc::new(cache(3));
        let builds = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let builds = Arc::clone(&builds);
            let barrier = Arc::clone(&barrier);
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                cache
                    .get_or_build(5, || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        Ok(graph(5))
                    })
                    .unwrap()
            }));
        }
        let graphs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        for g in &graphs[1..] {
            assert!(Arc::ptr_eq(&graphs[0], g));
        }
    }
}
