//! Pinned reveal sequencing
//!
//! Given exactly two content blocks `[main, reveal]`, the main block is pinned
//! and scrubbed upward by the reveal panel's height so the panel appears to
//! slide out from underneath it. The binding is rebuilt whenever layout is
//! invalidated so its travel distance always matches the current height.
//!
//! Every degenerate input degrades to "no animation" and is reported through
//! [`RevealStatus`], never as an error to the caller.

mod binding;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vitrine_core::{Document, ElementId, Error, Result, RevealConfig};

pub use binding::{RevealBinding, RevealPair, ScrubRange};

use crate::plugins::{self, TriggerRegistry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealStatus {
    /// Nothing set up yet
    Idle,
    /// Input was not exactly two elements; children render unmodified
    Passthrough,
    Measuring,
    /// Reveal panel had zero height; waiting to re-measure once
    Deferred,
    Active { height: f64 },
    /// Still zero height after the re-measure; no binding exists. On first
    /// setup this is final, after a rebuild the next layout change retries.
    ZeroHeight,
    /// The document rejected an element of the pair
    Failed,
    Disposed,
}

#[derive(Debug, Default)]
struct Slot {
    /// Bumped on teardown so a superseded setup can never install a binding
    generation: u64,
    binding: Option<RevealBinding>,
}

struct Driver<D: Document> {
    doc: Arc<D>,
    pair: RevealPair,
    config: RevealConfig,
    slot: Arc<Mutex<Slot>>,
    status_tx: Arc<watch::Sender<RevealStatus>>,
    registry: &'static TriggerRegistry,
    generation: u64,
}

impl<D: Document> Driver<D> {
    async fn run(self) {
        let mut scroll_rx = self.doc.subscribe_scroll();
        let mut layout_rx = self.doc.subscribe_layout();

        let mut rebuilding = false;
        loop {
            layout_rx.borrow_and_update();

            let Some(height) = self.measure().await else {
                self.set_status(RevealStatus::ZeroHeight);
                if !rebuilding {
                    debug!(element = %self.pair.reveal, "Reveal panel still has zero height, binding not created");
                    return;
                }
                // Collapsed during a reflow; the next layout change may restore it
                debug!(element = %self.pair.reveal, "Reveal panel collapsed, waiting for next layout change");
                if layout_rx.changed().await.is_err() {
                    return;
                }
                continue;
            };
            if !self.install(height) {
                return;
            }
            rebuilding = true;

            scroll_rx.borrow_and_update();
            if !self.follow(&mut scroll_rx, &mut layout_rx).await {
                return;
            }
            debug!("Layout invalidated, rebuilding reveal binding");
        }
    }

    /// Measure the reveal panel, re-measuring once after a delay when it has
    /// not been laid out yet
    async fn measure(&self) -> Option<f64> {
        self.set_status(RevealStatus::Measuring);
        let height = self.reveal_height();
        if height > 0.0 {
            return Some(height);
        }

        self.set_status(RevealStatus::Deferred);
        debug!(
            delay_ms = self.config.remeasure_delay_ms,
            "Reveal panel not laid out yet, deferring measurement"
        );
        tokio::time::sleep(self.config.remeasure_delay()).await;

        let height = self.reveal_height();
        (height > 0.0).then_some(height)
    }

    fn reveal_height(&self) -> f64 {
        match self.doc.measure(self.pair.reveal) {
            Ok(rect) => rect.height.max(0.0),
            Err(e) => {
                warn!(error = %e, "Failed to measure reveal panel");
                0.0
            }
        }
    }

    fn install(&self, height: f64) -> bool {
        let trigger = match self.doc.measure(self.pair.trigger) {
            Ok(rect) => rect,
            Err(e) => {
                warn!(error = %e, "Failed to measure reveal trigger");
                self.set_status(RevealStatus::Failed);
                return false;
            }
        };
        let range = ScrubRange::from_trigger(trigger, self.doc.viewport(), height);

        let mut slot = self.slot.lock();
        if slot.generation != self.generation {
            return false;
        }
        if let Some(stale) = slot.binding.take() {
            stale.destroy(self.doc.as_ref());
        }

        let binding = RevealBinding::build(self.pair, range, self.registry);
        if let Err(e) = binding.apply(self.doc.as_ref(), self.doc.scroll_y()) {
            warn!(error = %e, "Failed to apply reveal binding");
        }
        slot.binding = Some(binding);
        self.status_tx.send_replace(RevealStatus::Active { height });
        info!(height, start = range.start, end = range.end(), "Reveal binding created");
        true
    }

    /// Scrub the binding until layout is invalidated. Returns true when the
    /// binding was destroyed for a rebuild, false when this driver must stop.
    async fn follow(
        &self,
        scroll_rx: &mut watch::Receiver<f64>,
        layout_rx: &mut watch::Receiver<u64>,
    ) -> bool {
        loop {
            tokio::select! {
                changed = scroll_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                    let scroll_y = *scroll_rx.borrow_and_update();
                    let slot = self.slot.lock();
                    if slot.generation != self.generation {
                        return false;
                    }
                    if let Some(binding) = &slot.binding {
                        if let Err(e) = binding.apply(self.doc.as_ref(), scroll_y) {
                            warn!(error = %e, "Failed to apply reveal binding");
                        }
                    }
                }
                changed = layout_rx.changed(), if self.config.rebuild_on_invalidate => {
                    if changed.is_err() {
                        return false;
                    }
                    let mut slot = self.slot.lock();
                    if slot.generation != self.generation {
                        return false;
                    }
                    if let Some(binding) = slot.binding.take() {
                        binding.destroy(self.doc.as_ref());
                    }
                    return true;
                }
            }
        }
    }

    fn set_status(&self, status: RevealStatus) {
        let slot = self.slot.lock();
        if slot.generation == self.generation {
            self.status_tx.send_replace(status);
        }
    }
}

/// Pins a main block and scroll-links its exit to a reveal panel's height.
///
/// Dropping the sequencer cancels a pending re-measure and destroys the live
/// binding.
pub struct PinnedRevealSequencer<D: Document> {
    doc: Arc<D>,
    config: RevealConfig,
    container: ElementId,
    children: Vec<ElementId>,
    slot: Arc<Mutex<Slot>>,
    status_tx: Arc<watch::Sender<RevealStatus>>,
    registry: &'static TriggerRegistry,
    runtime: Handle,
    task: Option<JoinHandle<()>>,
}

impl<D: Document> PinnedRevealSequencer<D> {
    /// Attach to `container` whose content is `children` in document order
    pub fn mount(doc: Arc<D>, container: ElementId, children: Vec<ElementId>, config: RevealConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let mut sequencer = Self {
            doc,
            config,
            container,
            children,
            slot: Arc::new(Mutex::new(Slot::default())),
            status_tx: Arc::new(watch::Sender::new(RevealStatus::Idle)),
            registry: plugins::ensure_registered(),
            runtime,
            task: None,
        };
        sequencer.setup();
        Ok(sequencer)
    }

    /// Replace the content blocks. The previous binding is destroyed before
    /// a new one is built. Returns false when the list is unchanged.
    pub fn set_children(&mut self, children: Vec<ElementId>) -> bool {
        if children == self.children {
            return false;
        }
        self.teardown();
        self.children = children;
        self.status_tx.send_replace(RevealStatus::Idle);
        self.setup();
        true
    }

    pub fn status(&self) -> RevealStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RevealStatus> {
        self.status_tx.subscribe()
    }

    /// Range of the live binding, if any
    pub fn range(&self) -> Option<ScrubRange> {
        self.slot.lock().binding.as_ref().map(RevealBinding::range)
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn dispose(self) {}

    fn setup(&mut self) {
        let pair = match RevealPair::from_children(self.container, &self.children) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, container = %self.container, "Rendering reveal children unmodified");
                self.status_tx.send_replace(RevealStatus::Passthrough);
                return;
            }
        };

        if let Err(e) = pair.apply_roles(self.doc.as_ref()) {
            warn!(error = %e, "Failed to apply reveal layout roles");
            self.status_tx.send_replace(RevealStatus::Failed);
            return;
        }

        let driver = Driver {
            doc: Arc::clone(&self.doc),
            pair,
            config: self.config.clone(),
            slot: Arc::clone(&self.slot),
            status_tx: Arc::clone(&self.status_tx),
            registry: self.registry,
            generation: self.slot.lock().generation,
        };
        self.task = Some(self.runtime.spawn(driver.run()));
    }

    fn teardown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut slot = self.slot.lock();
        slot.generation += 1;
        if let Some(binding) = slot.binding.take() {
            binding.destroy(self.doc.as_ref());
            debug!(container = %self.container, "Reveal binding destroyed");
        }
    }
}

impl<D: Document> Drop for PinnedRevealSequencer<D> {
    fn drop(&mut self) {
        self.teardown();
        self.status_tx.send_replace(RevealStatus::Disposed);
    }
}
