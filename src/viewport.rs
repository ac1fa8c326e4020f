//! Viewport and device observation.
//!
//! Pure derived state: every resize recomputes the breakpoint flags and
//! notifies subscribers synchronously, with no debouncing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Breakpoints {
    /// Widest viewport still considered a phone
    pub mobile_max_width: u32,
    /// Widest viewport still considered a tablet
    pub tablet_max_width: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            mobile_max_width: 767,
            tablet_max_width: 1023,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
}

impl Viewport {
    pub fn compute(width: u32, height: u32, breakpoints: &Breakpoints) -> Self {
        let is_mobile = width <= breakpoints.mobile_max_width;
        let is_tablet = !is_mobile && width <= breakpoints.tablet_max_width;
        Self {
            width,
            height,
            is_mobile,
            is_tablet,
            is_desktop: !is_mobile && !is_tablet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Viewport) + Send>;

pub struct ViewportObserver {
    breakpoints: Breakpoints,
    current: Viewport,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl ViewportObserver {
    pub fn new(width: u32, height: u32, breakpoints: Breakpoints) -> Self {
        Self {
            breakpoints,
            current: Viewport::compute(width, height, &breakpoints),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn current(&self) -> Viewport {
        self.current
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Viewport) + Send + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    /// Handle a resize event. Subscribers hear about every call, even when
    /// the dimensions did not change.
    pub fn resize(&mut self, width: u32, height: u32) -> Viewport {
        self.current = Viewport::compute(width, height, &self.breakpoints);
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.current);
        }
        self.current
    }
}

/// Flips visibility once the page is scrolled past a threshold, e.g. to show
/// a floating audio control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrigger {
    threshold: f64,
    visible: bool,
}

impl ScrollTrigger {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the new visibility when it changed.
    pub fn on_scroll(&mut self, scroll_y: f64) -> Option<bool> {
        let visible = scroll_y > self.threshold;
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        Some(visible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Fraction of `self` that lies inside `other`.
    pub fn intersection_ratio(&self, other: &Rect) -> f64 {
        let area = self.area();
        if area == 0.0 {
            return 0.0;
        }
        let left = self.x.max(other.x);
        let right = (self.x + self.width).min(other.x + other.width);
        let top = self.y.max(other.y);
        let bottom = (self.y + self.height).min(other.y + other.height);
        let overlap = (right - left).max(0.0) * (bottom - top).max(0.0);
        overlap / area
    }
}

/// In-view detection for one element, for reveal-on-scroll sections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityObserver {
    threshold: f64,
    /// Stay visible after the first reveal
    once: bool,
    visible: bool,
}

impl VisibilityObserver {
    pub fn new(threshold: f64, once: bool) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            once,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the new visibility when it changed.
    pub fn update(&mut self, element: &Rect, viewport: &Rect) -> Option<bool> {
        if self.once && self.visible {
            return None;
        }
        let ratio = element.intersection_ratio(viewport);
        let visible = ratio > 0.0 && ratio >= self.threshold;
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        Some(visible)
    }
}
