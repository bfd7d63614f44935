//! Discrete section navigation
//!
//! Converts continuous wheel input on desktop viewports into one-section jumps
//! between full-viewport sections. A scroll lock keeps at most one programmatic
//! jump in flight; wheel events arriving while it is held are swallowed, not
//! queued.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vitrine_core::{
    Document, ElementId, Error, ListenerId, NavigatorConfig, Result, ScrollBehavior, Viewport,
    WheelEvent,
};

use crate::viewport::{is_desktop, section_index, step_target, Direction};

/// What a single wheel event resulted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelOutcome {
    /// A jump is in flight; the event was swallowed
    Suppressed,
    /// No direction or no sections; native scrolling proceeds
    Ignored,
    /// Already at the first/last section; native scrolling proceeds
    Boundary { index: usize },
    /// Smooth jump started between two sections
    Jumped { from: usize, to: usize },
}

#[derive(Debug, Default)]
struct ScrollLock {
    held: bool,
    /// Bumped per jump so a stale release never unlocks a newer jump
    generation: u64,
    release: Option<JoinHandle<()>>,
}

impl ScrollLock {
    fn reset(&mut self) {
        if let Some(task) = self.release.take() {
            task.abort();
        }
        self.held = false;
        self.generation += 1;
    }
}

#[derive(Debug, Default)]
struct ListenerSlot {
    id: Option<ListenerId>,
    /// Set by teardown; a viewport poll already in flight must not reinstall
    disposed: bool,
}

struct Inner<D: Document> {
    doc: Arc<D>,
    config: NavigatorConfig,
    runtime: Handle,
    lock: Mutex<ScrollLock>,
    listener: Mutex<ListenerSlot>,
}

impl<D: Document> Inner<D> {
    fn handle_wheel(self: &Arc<Self>, event: &mut WheelEvent) -> WheelOutcome {
        if self.lock.lock().held {
            event.prevent_default();
            return WheelOutcome::Suppressed;
        }

        let Some(direction) = Direction::from_delta(event.delta_y) else {
            return WheelOutcome::Ignored;
        };

        // Re-queried per event so inserted/removed sections count immediately
        let sections = self.doc.query_all(&self.config.section_marker);
        if sections.is_empty() {
            return WheelOutcome::Ignored;
        }

        let current = section_index(self.doc.scroll_y(), self.doc.viewport().height);
        let Some(target) = step_target(current, direction, sections.len()) else {
            debug!(index = current, ?direction, "At section boundary, leaving wheel to native scroll");
            return WheelOutcome::Boundary { index: current };
        };

        event.prevent_default();
        self.begin_jump(sections[target]);
        debug!(from = current, to = target, "Section jump started");
        WheelOutcome::Jumped {
            from: current,
            to: target,
        }
    }

    fn begin_jump(self: &Arc<Self>, section: ElementId) {
        let generation = {
            let mut lock = self.lock.lock();
            if let Some(task) = lock.release.take() {
                task.abort();
            }
            lock.held = true;
            lock.generation += 1;
            lock.generation
        };

        let completion = match self.doc.scroll_into_view(section, ScrollBehavior::Smooth) {
            Ok(completion) => completion,
            Err(e) => {
                warn!(error = %e, "Scroll into view failed");
                None
            }
        };
        let completion = completion.filter(|_| self.config.release_on_scroll_end);

        let settle = self.config.settle();
        let weak = Arc::downgrade(self);
        let task = self.runtime.spawn(async move {
            match completion {
                Some(done) => {
                    let _ = done.await;
                }
                None => tokio::time::sleep(settle).await,
            }
            if let Some(inner) = weak.upgrade() {
                inner.release(generation);
            }
        });

        let mut lock = self.lock.lock();
        if lock.generation == generation {
            lock.release = Some(task);
        } else {
            task.abort();
        }
    }

    fn release(&self, generation: u64) {
        let mut lock = self.lock.lock();
        if lock.generation == generation && lock.held {
            lock.held = false;
            lock.release = None;
            debug!("Scroll lock released");
        }
    }

    /// Install or remove the wheel listener to match the current viewport.
    /// Returns whether a listener is installed afterwards.
    fn sync_listener(self: &Arc<Self>) -> bool {
        let viewport = self.doc.viewport();
        let wanted = is_desktop(viewport, self.config.min_viewport_width);
        let mut listener = self.listener.lock();
        if listener.disposed {
            return false;
        }

        match (listener.id, wanted) {
            (None, true) => {
                let sections = self.doc.query_all(&self.config.section_marker).len();
                if sections == 0 {
                    debug!(
                        marker = %self.config.section_marker,
                        "No sections in document, wheel navigation not installed"
                    );
                    return false;
                }

                let weak: Weak<Self> = Arc::downgrade(self);
                let id = self.doc.add_wheel_listener(Arc::new(move |event: &mut WheelEvent| {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_wheel(event);
                    }
                }));
                listener.id = Some(id);
                info!(width = viewport.width, sections, "Wheel section navigation installed");
                true
            }
            (Some(id), false) => {
                self.doc.remove_wheel_listener(id);
                listener.id = None;
                self.lock.lock().reset();
                info!(width = viewport.width, "Viewport below desktop width, wheel navigation removed");
                false
            }
            (current, _) => current.is_some(),
        }
    }

    fn teardown(&self) {
        let mut listener = self.listener.lock();
        listener.disposed = true;
        if let Some(id) = listener.id.take() {
            self.doc.remove_wheel_listener(id);
        }
        drop(listener);
        self.lock.lock().reset();
    }
}

async fn watch_viewport<D: Document>(
    weak: Weak<Inner<D>>,
    mut viewport_rx: watch::Receiver<Viewport>,
    mount_delay: Duration,
) {
    tokio::time::sleep(mount_delay).await;
    let Some(inner) = weak.upgrade() else {
        return;
    };
    inner.sync_listener();

    if !inner.config.reevaluate_on_resize {
        return;
    }
    drop(inner);

    viewport_rx.borrow_and_update();
    while viewport_rx.changed().await.is_ok() {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        inner.sync_listener();
    }
}

/// Wheel-driven section navigator attached to a document.
///
/// Dropping the navigator removes its listener and cancels every pending
/// timer.
pub struct DiscreteScrollNavigator<D: Document> {
    inner: Arc<Inner<D>>,
    mount_task: Option<JoinHandle<()>>,
}

impl<D: Document> DiscreteScrollNavigator<D> {
    /// Attach to `doc`. The wheel listener is installed after the configured
    /// mount delay, and only on desktop-width viewports.
    pub fn mount(doc: Arc<D>, config: NavigatorConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let viewport_rx = doc.subscribe_viewport();
        let mount_delay = config.mount_delay();

        let inner = Arc::new(Inner {
            doc,
            config,
            runtime: runtime.clone(),
            lock: Mutex::new(ScrollLock::default()),
            listener: Mutex::new(ListenerSlot::default()),
        });
        let mount_task = runtime.spawn(watch_viewport(Arc::downgrade(&inner), viewport_rx, mount_delay));

        Ok(Self {
            inner,
            mount_task: Some(mount_task),
        })
    }

    /// Process a wheel event directly, bypassing the document listener
    pub fn handle_wheel(&self, event: &mut WheelEvent) -> WheelOutcome {
        self.inner.handle_wheel(event)
    }

    pub fn is_installed(&self) -> bool {
        self.inner.listener.lock().id.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.lock.lock().held
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.inner.config
    }

    pub fn dispose(self) {}
}

impl<D: Document> Drop for DiscreteScrollNavigator<D> {
    fn drop(&mut self) {
        if let Some(task) = self.mount_task.take() {
            task.abort();
        }
        self.inner.teardown();
        debug!("Section navigator disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::host::MemoryDocument;

    fn document(width: f64, sections: usize) -> (Arc<MemoryDocument>, Vec<ElementId>) {
        let doc = Arc::new(MemoryDocument::new(Viewport::new(width, 800.0)));
        let ids = doc.append_sections("section", sections);
        (doc, ids)
    }

    async fn wait_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    async fn mounted(doc: &Arc<MemoryDocument>, config: NavigatorConfig) -> DiscreteScrollNavigator<MemoryDocument> {
        let navigator = DiscreteScrollNavigator::mount(Arc::clone(doc), config).unwrap();
        wait_ms(501).await;
        assert!(navigator.is_installed());
        navigator
    }

    #[test]
    fn test_mount_requires_runtime() {
        let (doc, _) = document(1280.0, 2);
        let result = DiscreteScrollNavigator::mount(doc, NavigatorConfig::default());
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_installed_after_mount_delay() {
        let (doc, _) = document(1280.0, 3);
        let navigator = DiscreteScrollNavigator::mount(Arc::clone(&doc), NavigatorConfig::default()).unwrap();

        wait_ms(499).await;
        assert!(!navigator.is_installed());
        assert_eq!(doc.listener_count(), 0);

        wait_ms(2).await;
        assert!(navigator.is_installed());
        assert_eq!(doc.listener_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_narrow_viewport_never_installs() {
        let (doc, _) = document(600.0, 3);
        let navigator = DiscreteScrollNavigator::mount(Arc::clone(&doc), NavigatorConfig::default()).unwrap();
        wait_ms(600).await;

        assert!(!navigator.is_installed());
        assert!(!doc.dispatch_wheel(100.0).is_default_prevented());
        assert!(doc.scroll_into_view_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_sections_never_installs() {
        let (doc, _) = document(1280.0, 0);
        doc.append_element(&["hero"], 2000.0);
        let navigator = DiscreteScrollNavigator::mount(Arc::clone(&doc), NavigatorConfig::default()).unwrap();
        wait_ms(600).await;

        assert!(!navigator.is_installed());
        assert_eq!(doc.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_jump_from_third_section() {
        let (doc, ids) = document(1280.0, 4);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;
        doc.set_scroll_y(1600.0);

        let event = doc.dispatch_wheel(100.0);
        assert!(event.is_default_prevented());
        assert_eq!(doc.scroll_into_view_calls(), vec![ids[3]]);
        assert!(navigator.is_locked());

        wait_ms(799).await;
        assert!(navigator.is_locked());
        wait_ms(2).await;
        assert!(!navigator.is_locked());
        assert_eq!(doc.scroll_y(), 2400.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backward_jump_from_interior() {
        let (doc, ids) = document(1280.0, 4);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;
        doc.set_scroll_y(800.0);

        let mut event = WheelEvent::new(-40.0);
        assert_eq!(navigator.handle_wheel(&mut event), WheelOutcome::Jumped { from: 1, to: 0 });
        assert!(event.is_default_prevented());
        assert_eq!(doc.scroll_into_view_calls(), vec![ids[0]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_while_locked_are_swallowed() {
        let (doc, ids) = document(1280.0, 4);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;
        doc.set_scroll_y(800.0);

        assert!(doc.dispatch_wheel(100.0).is_default_prevented());
        for delta in [100.0, -100.0, 300.0, -5.0] {
            wait_ms(50).await;
            let mut event = WheelEvent::new(delta);
            assert_eq!(navigator.handle_wheel(&mut event), WheelOutcome::Suppressed);
            assert!(event.is_default_prevented());
        }
        assert_eq!(doc.scroll_into_view_calls(), vec![ids[2]]);

        wait_ms(700).await;
        assert!(!navigator.is_locked());
        assert_eq!(doc.scroll_y(), 1600.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_boundaries_fall_through_to_native_scroll() {
        let (doc, _) = document(1280.0, 4);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;

        let mut event = WheelEvent::new(-100.0);
        assert_eq!(navigator.handle_wheel(&mut event), WheelOutcome::Boundary { index: 0 });
        assert!(!event.is_default_prevented());

        doc.set_scroll_y(2400.0);
        let mut event = WheelEvent::new(100.0);
        assert_eq!(navigator.handle_wheel(&mut event), WheelOutcome::Boundary { index: 3 });
        assert!(!event.is_default_prevented());

        assert!(doc.scroll_into_view_calls().is_empty());
        assert!(!navigator.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wheel_after_settle_is_honored() {
        let (doc, ids) = document(1280.0, 4);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;
        doc.set_scroll_y(1600.0);

        doc.dispatch_wheel(100.0);
        wait_ms(801).await;
        assert!(!navigator.is_locked());

        assert!(doc.dispatch_wheel(-100.0).is_default_prevented());
        assert_eq!(doc.scroll_into_view_calls(), vec![ids[3], ids[2]]);
        assert!(navigator.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_below_last_section_clamps_back() {
        let (doc, ids) = document(1280.0, 2);
        doc.append_element(&["footer"], 2400.0);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;
        doc.set_scroll_y(2400.0);

        let mut event = WheelEvent::new(100.0);
        assert_eq!(navigator.handle_wheel(&mut event), WheelOutcome::Jumped { from: 3, to: 1 });
        assert_eq!(doc.scroll_into_view_calls(), vec![ids[1]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delta_is_ignored() {
        let (doc, _) = document(1280.0, 4);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;

        let mut event = WheelEvent::new(0.0);
        assert_eq!(navigator.handle_wheel(&mut event), WheelOutcome::Ignored);
        assert!(!event.is_default_prevented());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sections_added_after_mount_are_honored() {
        let (doc, _) = document(1280.0, 2);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;
        let added = doc.append_sections("section", 2);

        doc.set_scroll_y(800.0);
        let mut event = WheelEvent::new(100.0);
        assert_eq!(navigator.handle_wheel(&mut event), WheelOutcome::Jumped { from: 1, to: 2 });
        assert_eq!(doc.scroll_into_view_calls(), vec![added[0]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_reinstalls_listener() {
        let (doc, _) = document(1280.0, 3);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;

        doc.set_viewport(Viewport::new(600.0, 800.0));
        wait_ms(1).await;
        assert!(!navigator.is_installed());
        assert_eq!(doc.listener_count(), 0);

        doc.set_viewport(Viewport::new(1024.0, 800.0));
        wait_ms(1).await;
        assert!(navigator.is_installed());
        assert_eq!(doc.listener_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_gating_ignores_resize() {
        let (doc, _) = document(1280.0, 3);
        let config = NavigatorConfig {
            reevaluate_on_resize: false,
            ..Default::default()
        };
        let navigator = mounted(&doc, config).await;

        doc.set_viewport(Viewport::new(600.0, 800.0));
        wait_ms(1).await;
        assert!(navigator.is_installed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_removes_listener_and_pending_release() {
        let (doc, _) = document(1280.0, 4);
        let navigator = mounted(&doc, NavigatorConfig::default()).await;
        doc.set_scroll_y(800.0);
        doc.dispatch_wheel(100.0);
        assert!(navigator.is_locked());

        navigator.dispose();
        assert_eq!(doc.listener_count(), 0);

        wait_ms(900).await;
        let before = doc.scroll_y();
        assert!(!doc.dispatch_wheel(100.0).is_default_prevented());
        assert_eq!(doc.scroll_y(), before + 100.0);
        assert_eq!(doc.scroll_into_view_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_before_mount_delay_never_installs() {
        let (doc, _) = document(1280.0, 3);
        let navigator = DiscreteScrollNavigator::mount(Arc::clone(&doc), NavigatorConfig::default()).unwrap();
        wait_ms(100).await;
        drop(navigator);

        wait_ms(500).await;
        assert_eq!(doc.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewport_sync_after_teardown_is_fenced() {
        let (doc, _) = document(1280.0, 3);
        let navigator = DiscreteScrollNavigator::mount(Arc::clone(&doc), NavigatorConfig::default()).unwrap();
        // A viewport poll that upgraded its weak handle before the drop
        let in_flight = Arc::clone(&navigator.inner);
        drop(navigator);

        assert!(!in_flight.sync_listener());
        assert_eq!(doc.listener_count(), 0);
        assert!(in_flight.listener.lock().id.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_on_scroll_end_signal() {
        let doc = Arc::new(MemoryDocument::new(Viewport::new(1280.0, 800.0)).with_scroll_end_signals(true));
        doc.append_sections("section", 3);
        let config = NavigatorConfig {
            release_on_scroll_end: true,
            ..Default::default()
        };
        let navigator = mounted(&doc, config).await;

        doc.dispatch_wheel(100.0);
        assert!(navigator.is_locked());

        // Smooth scroll takes 600ms by default, well inside the 800ms window
        wait_ms(650).await;
        assert!(!navigator.is_locked());
        assert_eq!(doc.scroll_y(), 800.0);
    }
}
