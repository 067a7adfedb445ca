//! Keeping the HTML cache in step with the publish lifecycle.
//!
//! With `publish_event_rendering` on, pages are rendered as they are
//! published and the indexer later reads the stored HTML. Unpublishing,
//! trashing or deleting a page drops its row. Removing the page from the
//! index itself is left to the index's own lifecycle hooks.

use std::sync::{Arc, Once};

use pagesearch_core::{NodeId, Result, SearchConfig};

use crate::node::ContentNode;
use crate::prerender::PreRenderer;
use crate::timeout::{ScriptTimeout, extend_budget};

/// A lifecycle signal from the host CMS.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEvent {
    /// A publish is about to start.
    BeforePublish(NodeId),
    /// A node was published and the host's own page cache refreshed.
    Published(ContentNode),
    /// A node was unpublished.
    Unpublished(NodeId),
    /// A node was moved to the recycle bin.
    Trashed(NodeId),
    /// A node was deleted permanently.
    Deleted(NodeId),
}

/// A source of lifecycle events the handlers can subscribe to.
pub trait ContentEvents: Send + Sync {
    /// Deliver every future event to `handlers`.
    fn subscribe(&self, handlers: Arc<PublishHandlers>);
}

/// Reacts to lifecycle events by rendering into, or clearing, the cache.
pub struct PublishHandlers {
    config: Arc<SearchConfig>,
    prerender: Arc<PreRenderer>,
    timeout: Option<Arc<dyn ScriptTimeout>>,
    attached: Once,
}

impl PublishHandlers {
    /// Create handlers writing through `prerender`.
    pub fn new(config: Arc<SearchConfig>, prerender: Arc<PreRenderer>) -> Self {
        Self {
            config,
            prerender,
            timeout: None,
            attached: Once::new(),
        }
    }

    /// Raise the host's script timeout before rendering.
    pub fn with_timeout(mut self, timeout: Arc<dyn ScriptTimeout>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether events have any effect under the current configuration.
    pub fn is_active(&self) -> bool {
        self.config.enabled && self.config.publish_event_rendering
    }

    /// Subscribe to `events`. Only the first call on an active handler set
    /// subscribes; returns whether this call did.
    pub fn attach(self: &Arc<Self>, events: &dyn ContentEvents) -> bool {
        if !self.is_active() {
            log::debug!("Publish event rendering is off, not subscribing");
            return false;
        }
        let mut subscribed = false;
        self.attached.call_once(|| {
            events.subscribe(Arc::clone(self));
            subscribed = true;
        });
        if subscribed {
            log::info!("Publish handlers attached");
        }
        subscribed
    }

    /// Handle one event.
    ///
    /// Cache failures are logged and swallowed; only fatal errors return.
    pub async fn handle(&self, event: &ContentEvent) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        match event {
            ContentEvent::BeforePublish(_) => {
                extend_budget(&self.config, self.timeout.as_deref());
            }
            ContentEvent::Published(node) => {
                if node.id < 1 {
                    return Ok(());
                }
                extend_budget(&self.config, self.timeout.as_deref());
                let stored = self.prerender.render_to_cache(node).await?;
                log::debug!("Published node {}: cached={stored}", node.id);
            }
            ContentEvent::Unpublished(id) | ContentEvent::Trashed(id) | ContentEvent::Deleted(id) => {
                if *id > 0 {
                    self.prerender.remove(*id).await?;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PublishHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishHandlers")
            .field("active", &self.is_active())
            .field("prerender", &self.prerender)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::{HtmlCache, MemoryHtmlCache};
    use crate::eligibility::Eligibility;
    use crate::render::{ContentRenderer, RendererRegistry};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct NameRenderer;

    #[async_trait]
    impl ContentRenderer for NameRenderer {
        async fn render(&self, node: &ContentNode) -> Result<Option<String>> {
            Ok(Some(format!("<p>{}</p>", node.name)))
        }

        fn name(&self) -> &str {
            "name"
        }
    }

    #[derive(Default)]
    struct Bus {
        subscribers: Mutex<Vec<Arc<PublishHandlers>>>,
    }

    impl ContentEvents for Bus {
        fn subscribe(&self, handlers: Arc<PublishHandlers>) {
            if let Ok(mut subscribers) = self.subscribers.lock() {
                subscribers.push(handlers);
            }
        }
    }

    impl Bus {
        async fn emit(&self, event: ContentEvent) {
            let subscribers = self.subscribers.lock().unwrap().clone();
            for handlers in subscribers {
                handlers.handle(&event).await.unwrap();
            }
        }
    }

    #[derive(Default)]
    struct Budget(Mutex<Vec<Duration>>);

    impl ScriptTimeout for Budget {
        fn set_timeout(&self, budget: Duration) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(budget);
            }
        }
    }

    fn active_config() -> SearchConfig {
        SearchConfig {
            publish_event_rendering: true,
            script_timeout_secs: Some(300),
            ..SearchConfig::default()
        }
    }

    fn handlers(config: SearchConfig) -> (Arc<PublishHandlers>, Arc<MemoryHtmlCache>, Arc<Budget>) {
        let cache = Arc::new(MemoryHtmlCache::new());
        let prerender = PreRenderer::new(
            RendererRegistry::new(Arc::new(NameRenderer)),
            Eligibility::from_config(&config),
            cache.clone(),
        );
        let budget = Arc::new(Budget::default());
        let handlers = PublishHandlers::new(Arc::new(config), Arc::new(prerender))
            .with_timeout(budget.clone());
        (Arc::new(handlers), cache, budget)
    }

    fn page(id: NodeId) -> ContentNode {
        ContentNode::new(id, format!("Page {id}"), "Page").with_template(1)
    }

    #[tokio::test]
    async fn test_publish_then_unpublish() {
        let (handlers, cache, budget) = handlers(active_config());
        let bus = Bus::default();
        assert!(handlers.attach(&bus));

        bus.emit(ContentEvent::BeforePublish(10)).await;
        bus.emit(ContentEvent::Published(page(10))).await;
        bus.emit(ContentEvent::Published(page(11))).await;
        assert_eq!(cache.get(10).await.unwrap().as_deref(), Some("<p>Page 10</p>"));
        assert_eq!(budget.0.lock().unwrap().len(), 3);

        bus.emit(ContentEvent::Unpublished(10)).await;
        assert!(cache.get(10).await.unwrap().is_none());
        assert!(cache.get(11).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_trash_and_delete_remove_rows() {
        let (handlers, cache, _) = handlers(active_config());
        handlers.handle(&ContentEvent::Published(page(1))).await.unwrap();
        handlers.handle(&ContentEvent::Published(page(2))).await.unwrap();
        handlers.handle(&ContentEvent::Trashed(1)).await.unwrap();
        handlers.handle(&ContentEvent::Deleted(2)).await.unwrap();
        handlers.handle(&ContentEvent::Deleted(-1)).await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_attach_is_start_once() {
        let (handlers, _, _) = handlers(active_config());
        let bus = Bus::default();
        assert!(handlers.attach(&bus));
        assert!(!handlers.attach(&bus));
        assert_eq!(bus.subscribers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_handlers_do_nothing() {
        let (handlers, cache, _) = handlers(SearchConfig::default());
        let bus = Bus::default();
        assert!(!handlers.attach(&bus));
        handlers.handle(&ContentEvent::Published(page(1))).await.unwrap();
        assert!(cache.is_empty().await);

        let (disabled, cache, _) = handlers_disabled();
        disabled.handle(&ContentEvent::Published(page(1))).await.unwrap();
        assert!(cache.is_empty().await);
    }

    fn handlers_disabled() -> (Arc<PublishHandlers>, Arc<MemoryHtmlCache>, Arc<Budget>) {
        handlers(SearchConfig {
            enabled: false,
            ..active_config()
        })
    }
}
