//! Subscriptions on a target element and every ancestor above it.

use tracing::debug;

use crate::error::Result;
use crate::geometry::Rect;
use crate::host::{ElementId, ElementInfo, Host, SubscriptionId};
use crate::placement::visible_target_bounds;

/// Guards against a host reporting a parent cycle.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// `element` followed by its ancestors, nearest first.
pub fn element_chain(host: &dyn Host, element: ElementId) -> Vec<(ElementId, ElementInfo)> {
    let mut chain = Vec::new();
    let mut next = Some(element);
    while let Some(id) = next {
        if chain.len() >= MAX_ANCESTOR_DEPTH {
            break;
        }
        let Some(info) = host.element(id) else {
            break;
        };
        next = info.parent;
        chain.push((id, info));
    }
    chain
}

/// An element is showing only if it and every ancestor are visible.
pub fn is_showing(host: &dyn Host, element: ElementId) -> bool {
    let chain = element_chain(host, element);
    !chain.is_empty() && chain.iter().all(|(_, info)| info.visible)
}

/// Screen area where `element` can actually be seen on `screen`.
pub fn visible_bounds(host: &dyn Host, element: ElementId, screen: Rect) -> Rect {
    let chain = element_chain(host, element);
    let Some(((_, own), ancestors)) = chain.split_first() else {
        return Rect::default();
    };
    let clips: Vec<Rect> = ancestors.iter().map(|(_, info)| info.screen_bounds).collect();
    visible_target_bounds(own.screen_bounds, &clips, screen)
}

/// Active subscriptions for one tracked element.
///
/// Registration and teardown are explicit pairs; nothing is released by drop.
#[derive(Debug, Default)]
pub struct TrackingRegistry {
    target: Option<ElementId>,
    subscriptions: Vec<(ElementId, SubscriptionId)>,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn subscriptions(&self) -> &[(ElementId, SubscriptionId)] {
        &self.subscriptions
    }

    pub fn owns(&self, subscription: SubscriptionId) -> bool {
        self.subscriptions.iter().any(|(_, s)| *s == subscription)
    }

    /// Subscribes to `target` and its ancestors. Re-registering the current
    /// target is a no-op; a different target replaces the old registrations.
    pub fn register(&mut self, host: &mut dyn Host, target: ElementId) -> Result<()> {
        if self.target == Some(target) {
            return Ok(());
        }
        self.unregister_all(host);
        let chain: Vec<ElementId> = element_chain(host, target).into_iter().map(|(id, _)| id).collect();
        for element in chain {
            match host.subscribe(element) {
                Ok(subscription) => self.subscriptions.push((element, subscription)),
                Err(err) => {
                    self.unregister_all(host);
                    return Err(err);
                }
            }
        }
        self.target = Some(target);
        debug!(target = %target, count = self.subscriptions.len(), "layout tracking registered");
        Ok(())
    }

    pub fn unregister_all(&mut self, host: &mut dyn Host) {
        if self.subscriptions.is_empty() && self.target.is_none() {
            return;
        }
        for (_, subscription) in self.subscriptions.drain(..) {
            host.unsubscribe(subscription);
        }
        if let Some(target) = self.target.take() {
            debug!(target = %target, "layout tracking unregistered");
        }
    }
}
