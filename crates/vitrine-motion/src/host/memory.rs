//! In-memory document used by tests and the headless simulator

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use vitrine_core::{
    Document, ElementId, Error, InlineStyle, ListenerId, Rect, Result, ScrollBehavior,
    ScrollCompletion, ScrollConfig, Style, Viewport, WheelEvent, WheelListener,
};

use crate::scroll::{ScrollAnimator, ScrollConfigExt};

/// Ids are unique per process so registries keyed by element never collide
/// between documents.
static NEXT_ELEMENT: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
struct Node {
    id: ElementId,
    markers: Vec<String>,
    rect: Rect,
    style: InlineStyle,
    /// Height follows the viewport height
    fills_viewport: bool,
}

#[derive(Default)]
struct DocState {
    /// Document order
    nodes: Vec<Node>,
    listeners: Vec<(ListenerId, WheelListener)>,
    next_listener: u64,
    scroll_calls: Vec<ElementId>,
    animation: Option<JoinHandle<()>>,
}

impl DocState {
    fn node(&self, id: ElementId) -> Result<&Node> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or(Error::UnknownElement(id))
    }

    fn node_mut(&mut self, id: ElementId) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(Error::UnknownElement(id))
    }

    /// Set a node's height and reflow the rest of the page: nodes earlier in
    /// document order that enclose it grow with it, nodes starting at or
    /// below its old bottom move by the same amount.
    fn resize(&mut self, id: ElementId, height: f64) -> Result<()> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(Error::UnknownElement(id))?;
        let old = self.nodes[index].rect;
        let delta = height - old.height;
        self.nodes[index].rect.height = height;
        if delta == 0.0 {
            return Ok(());
        }

        for (i, node) in self.nodes.iter_mut().enumerate() {
            if i == index {
                continue;
            }
            let encloses = i < index && node.rect.top <= old.top && node.rect.bottom() >= old.bottom();
            if encloses {
                node.rect.height += delta;
            } else if node.rect.top >= old.bottom() {
                node.rect.top += delta;
            }
        }
        Ok(())
    }

    fn document_height(&self) -> f64 {
        self.nodes
            .iter()
            .map(|n| n.rect.bottom())
            .fold(0.0, f64::max)
    }

    fn cancel_animation(&mut self) {
        if let Some(task) = self.animation.take() {
            task.abort();
        }
    }
}

pub struct MemoryDocument {
    state: Mutex<DocState>,
    scroll_tx: Arc<watch::Sender<f64>>,
    viewport_tx: watch::Sender<Viewport>,
    layout_tx: watch::Sender<u64>,
    scroll_config: ScrollConfig,
    scroll_end_signals: bool,
}

impl MemoryDocument {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: Mutex::new(DocState::default()),
            scroll_tx: Arc::new(watch::Sender::new(0.0)),
            viewport_tx: watch::Sender::new(viewport),
            layout_tx: watch::Sender::new(0),
            scroll_config: ScrollConfig::default(),
            scroll_end_signals: false,
        }
    }

    /// Animation settings for smooth scroll-into-view
    pub fn with_scroll_config(mut self, config: ScrollConfig) -> Self {
        self.scroll_config = config;
        self
    }

    /// Return a completion signal from every programmatic scroll
    pub fn with_scroll_end_signals(mut self, enabled: bool) -> Self {
        self.scroll_end_signals = enabled;
        self
    }

    /// Insert an element at an explicit position, after all existing ones
    pub fn add_element(&self, markers: &[&str], rect: Rect) -> ElementId {
        self.insert(markers, rect, false)
    }

    fn insert(&self, markers: &[&str], rect: Rect, fills_viewport: bool) -> ElementId {
        let id = ElementId(NEXT_ELEMENT.fetch_add(1, Ordering::Relaxed));
        self.state.lock().nodes.push(Node {
            id,
            markers: markers.iter().map(|m| m.to_string()).collect(),
            rect,
            style: InlineStyle::default(),
            fills_viewport,
        });
        self.invalidate_layout();
        id
    }

    /// Insert an element directly below the current end of the document
    pub fn append_element(&self, markers: &[&str], height: f64) -> ElementId {
        let top = self.document_height();
        self.add_element(markers, Rect::new(top, height))
    }

    /// Append `count` full-viewport sections carrying `marker`. Their height
    /// tracks later viewport changes.
    pub fn append_sections(&self, marker: &str, count: usize) -> Vec<ElementId> {
        let height = self.viewport().height;
        (0..count)
            .map(|_| {
                let top = self.document_height();
                self.insert(&[marker], Rect::new(top, height), true)
            })
            .collect()
    }

    pub fn remove_element(&self, id: ElementId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let before = state.nodes.len();
            state.nodes.retain(|n| n.id != id);
            state.nodes.len() != before
        };
        if removed {
            self.invalidate_layout();
        }
        removed
    }

    /// Change an element's rendered height (late image load, reflow).
    /// Enclosing elements grow and following elements move with it.
    pub fn resize_element(&self, id: ElementId, height: f64) -> Result<()> {
        self.state.lock().resize(id, height)?;
        self.invalidate_layout();
        Ok(())
    }

    /// Publish a new viewport and re-lay full-viewport sections to its height
    pub fn set_viewport(&self, viewport: Viewport) {
        {
            let mut state = self.state.lock();
            let filled: Vec<ElementId> = state
                .nodes
                .iter()
                .filter(|n| n.fills_viewport)
                .map(|n| n.id)
                .collect();
            for id in filled {
                let _ = state.resize(id, viewport.height);
            }
        }
        self.viewport_tx.send_replace(viewport);
        self.invalidate_layout();
    }

    /// Jump to an offset, clamped to the scrollable range. Cancels any
    /// running smooth scroll.
    pub fn set_scroll_y(&self, offset: f64) {
        let max = {
            let mut state = self.state.lock();
            state.cancel_animation();
            (state.document_height() - self.viewport().height).max(0.0)
        };
        self.scroll_tx.send_replace(offset.clamp(0.0, max));
    }

    /// Deliver a wheel event to every listener. When none prevented the
    /// default, the document scrolls natively by `delta_y`.
    pub fn dispatch_wheel(&self, delta_y: f64) -> WheelEvent {
        // Listeners call back into the document, so they run unlocked.
        let listeners: Vec<WheelListener> = self
            .state
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        let mut event = WheelEvent::new(delta_y);
        for listener in listeners {
            listener(&mut event);
        }

        if !event.is_default_prevented() {
            self.set_scroll_y(self.scroll_y() + delta_y);
        }
        event
    }

    pub fn invalidate_layout(&self) {
        self.layout_tx.send_modify(|generation| *generation += 1);
    }

    pub fn style(&self, id: ElementId) -> Option<InlineStyle> {
        self.state.lock().node(id).ok().map(|n| n.style.clone())
    }

    /// Targets of every `scroll_into_view` call so far
    pub fn scroll_into_view_calls(&self) -> Vec<ElementId> {
        self.state.lock().scroll_calls.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub fn document_height(&self) -> f64 {
        self.state.lock().document_height()
    }

    pub fn is_scrolling(&self) -> bool {
        self.state
            .lock()
            .animation
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn animate_to(&self, target: f64, max_scroll: f64) -> ScrollCompletion {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) if self.scroll_config.is_smooth() => runtime,
            _ => {
                self.scroll_tx.send_replace(target.clamp(0.0, max_scroll));
                return self.finished_signal();
            }
        };

        let mut animator = ScrollAnimator::new(self.scroll_config.clone());
        animator.set_scroll(self.scroll_y());
        animator.scroll_to(target, max_scroll);
        debug!(from = animator.current(), to = animator.target(), "Smooth scroll started");

        let tick = self.scroll_config.animation_tick_duration();
        let scroll_tx = Arc::clone(&self.scroll_tx);
        let (done_tx, done_rx) = oneshot::channel();

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                scroll_tx.send_replace(animator.update());
                if !animator.is_animating() {
                    break;
                }
            }
            let _ = done_tx.send(());
        });

        let mut state = self.state.lock();
        state.cancel_animation();
        state.animation = Some(task);

        self.scroll_end_signals.then_some(done_rx)
    }

    fn finished_signal(&self) -> ScrollCompletion {
        if !self.scroll_end_signals {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        Some(rx)
    }
}

impl Document for MemoryDocument {
    fn viewport(&self) -> Viewport {
        *self.viewport_tx.borrow()
    }

    fn scroll_y(&self) -> f64 {
        *self.scroll_tx.borrow()
    }

    fn query_all(&self, marker: &str) -> Vec<ElementId> {
        self.state
            .lock()
            .nodes
            .iter()
            .filter(|n| n.markers.iter().any(|m| m == marker))
            .map(|n| n.id)
            .collect()
    }

    fn measure(&self, element: ElementId) -> Result<Rect> {
        Ok(self.state.lock().node(element)?.rect)
    }

    fn set_style(&self, element: ElementId, style: Style) -> Result<()> {
        self.state.lock().node_mut(element)?.style.apply(style);
        Ok(())
    }

    fn scroll_into_view(&self, element: ElementId, behavior: ScrollBehavior) -> Result<ScrollCompletion> {
        let (target, max_scroll) = {
            let mut state = self.state.lock();
            let top = state.node(element)?.rect.top;
            state.scroll_calls.push(element);
            let max = (state.document_height() - self.viewport().height).max(0.0);
            (top, max)
        };
        debug!(element = %element, target, ?behavior, "Scroll into view");

        match behavior {
            ScrollBehavior::Smooth => Ok(self.animate_to(target, max_scroll)),
            ScrollBehavior::Instant => {
                self.state.lock().cancel_animation();
                self.scroll_tx.send_replace(target.clamp(0.0, max_scroll));
                Ok(self.finished_signal())
            }
        }
    }

    fn add_wheel_listener(&self, listener: WheelListener) -> ListenerId {
        let mut state = self.state.lock();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push((id, listener));
        id
    }

    fn remove_wheel_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(existing, _)| *existing != id);
        state.listeners.len() != before
    }

    fn subscribe_scroll(&self) -> watch::Receiver<f64> {
        self.scroll_tx.subscribe()
    }

    fn subscribe_viewport(&self) -> watch::Receiver<Viewport> {
        self.viewport_tx.subscribe()
    }

    fn subscribe_layout(&self) -> watch::Receiver<u64> {
        self.layout_tx.subscribe()
    }
}

impl Drop for MemoryDocument {
    fn drop(&mut self) {
        self.state.get_mut().cancel_animation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vitrine_core::EasingType;

    fn desktop() -> MemoryDocument {
        MemoryDocument::new(Viewport::new(1280.0, 800.0))
    }

    #[test]
    fn test_query_is_live_and_ordered() {
        let doc = desktop();
        let sections = doc.append_sections("section", 3);
        doc.append_element(&["footer"], 200.0);

        assert_eq!(doc.query_all("section"), sections);
        assert!(doc.remove_element(sections[1]));
        assert_eq!(doc.query_all("section"), vec![sections[0], sections[2]]);
        assert_eq!(doc.document_height(), 2600.0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let doc = desktop();
        doc.append_sections("section", 4);

        doc.set_scroll_y(99_999.0);
        assert_eq!(doc.scroll_y(), 2400.0);
        doc.set_scroll_y(-10.0);
        assert_eq!(doc.scroll_y(), 0.0);
    }

    #[test]
    fn test_unprevented_wheel_scrolls_natively() {
        let doc = desktop();
        doc.append_sections("section", 2);

        let event = doc.dispatch_wheel(120.0);
        assert!(!event.is_default_prevented());
        assert_eq!(doc.scroll_y(), 120.0);

        let id = doc.add_wheel_listener(Arc::new(|event: &mut WheelEvent| event.prevent_default()));
        assert!(doc.dispatch_wheel(120.0).is_default_prevented());
        assert_eq!(doc.scroll_y(), 120.0);

        assert!(doc.remove_wheel_listener(id));
        assert!(!doc.remove_wheel_listener(id));
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_unknown_element_errors() {
        let doc = desktop();
        let err = doc.measure(ElementId(0)).unwrap_err();
        assert!(matches!(err, Error::UnknownElement(_)));
        assert!(doc.set_style(ElementId(0), Style::ZIndex(1)).is_err());
    }

    #[test]
    fn test_resize_bumps_layout_generation() {
        let doc = desktop();
        let id = doc.append_element(&[], 0.0);
        let layout = doc.subscribe_layout();
        let before = *layout.borrow();

        doc.resize_element(id, 400.0).unwrap();
        assert_eq!(*layout.borrow(), before + 1);
        assert_eq!(doc.measure(id).unwrap().height, 400.0);
    }

    #[test]
    fn test_resize_reflows_following_and_enclosing_elements() {
        let doc = desktop();
        let sections = doc.append_sections("section", 2);
        let container = doc.add_element(&["reveal"], Rect::new(1600.0, 1300.0));
        let main = doc.add_element(&[], Rect::new(1600.0, 900.0));
        let reveal = doc.add_element(&[], Rect::new(2500.0, 400.0));
        let footer = doc.append_element(&["footer"], 800.0);

        doc.resize_element(reveal, 600.0).unwrap();
        assert_eq!(doc.measure(container).unwrap(), Rect::new(1600.0, 1500.0));
        assert_eq!(doc.measure(main).unwrap(), Rect::new(1600.0, 900.0));
        assert_eq!(doc.measure(footer).unwrap(), Rect::new(3100.0, 800.0));

        doc.resize_element(main, 800.0).unwrap();
        assert_eq!(doc.measure(container).unwrap(), Rect::new(1600.0, 1400.0));
        assert_eq!(doc.measure(reveal).unwrap(), Rect::new(2400.0, 600.0));
        assert_eq!(doc.measure(footer).unwrap(), Rect::new(3000.0, 800.0));

        doc.resize_element(sections[0], 900.0).unwrap();
        assert_eq!(doc.measure(sections[1]).unwrap().top, 900.0);
        assert_eq!(doc.measure(container).unwrap().top, 1700.0);
        assert_eq!(doc.document_height(), 3900.0);
    }

    #[test]
    fn test_zero_height_element_moves_the_next_one() {
        let doc = desktop();
        let empty = doc.append_element(&[], 0.0);
        let below = doc.append_element(&[], 300.0);

        doc.resize_element(empty, 200.0).unwrap();
        assert_eq!(doc.measure(below).unwrap(), Rect::new(200.0, 300.0));
    }

    #[test]
    fn test_viewport_height_relays_sections() {
        let doc = desktop();
        let sections = doc.append_sections("section", 3);
        let footer = doc.append_element(&["footer"], 200.0);

        doc.set_viewport(Viewport::new(1280.0, 1000.0));
        for (i, id) in sections.iter().enumerate() {
            assert_eq!(doc.measure(*id).unwrap(), Rect::new(i as f64 * 1000.0, 1000.0));
        }
        assert_eq!(doc.measure(footer).unwrap(), Rect::new(3000.0, 200.0));

        doc.set_viewport(Viewport::new(700.0, 1000.0));
        assert_eq!(doc.measure(sections[2]).unwrap().top, 2000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_smooth_scroll_into_view_settles_on_target() {
        let doc = desktop()
            .with_scroll_config(ScrollConfig {
                easing: EasingType::Linear,
                ..Default::default()
            })
            .with_scroll_end_signals(true);
        let sections = doc.append_sections("section", 4);

        let done = doc
            .scroll_into_view(sections[2], ScrollBehavior::Smooth)
            .unwrap()
            .expect("signals enabled");
        assert!(doc.is_scrolling());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let mid = doc.scroll_y();
        assert!(mid > 0.0 && mid < 1600.0, "mid-animation offset {}", mid);

        done.await.unwrap();
        assert_eq!(doc.scroll_y(), 1600.0);
        assert_eq!(doc.scroll_into_view_calls(), vec![sections[2]]);
    }

    #[test]
    fn test_scroll_without_runtime_is_instant() {
        let doc = desktop();
        let sections = doc.append_sections("section", 3);
        let completion = doc.scroll_into_view(sections[1], ScrollBehavior::Smooth).unwrap();
        assert!(completion.is_none());
        assert_eq!(doc.scroll_y(), 800.0);
    }
}
