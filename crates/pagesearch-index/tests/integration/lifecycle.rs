//! Publish lifecycle keeping cache and index in step.

use std::sync::{Arc, Mutex};

use pagesearch_fts::SearchErrorKind;
use pagesearch_index::{
    ContentEvent, ContentEvents, ContentTree, HtmlCache, MemoryHtmlCache, PublishHandlers,
};

use crate::common::{Site, config, ids};

#[derive(Default)]
struct Events {
    handlers: Mutex<Vec<Arc<PublishHandlers>>>,
}

impl ContentEvents for Events {
    fn subscribe(&self, handlers: Arc<PublishHandlers>) {
        self.handlers.lock().unwrap().push(handlers);
    }
}

impl Events {
    async fn emit(&self, event: ContentEvent) {
        let handlers = self.handlers.lock().unwrap().clone();
        for handler in handlers {
            handler.handle(&event).await.unwrap();
        }
    }
}

#[tokio::test]
async fn test_publish_index_unpublish() {
    let cache = Arc::new(MemoryHtmlCache::new());
    let site = Site::with_cache(config(true), cache.clone());
    let events = Events::default();
    assert!(site.manager.publish_handlers().attach(&events));
    assert!(!site.manager.publish_handlers().attach(&events));

    let pianos = site.tree.get(1052).await.unwrap().unwrap();
    events.emit(ContentEvent::Published(pianos.clone())).await;
    assert!(cache.get(1052).await.unwrap().is_some());

    site.manager.admin().reindex_nodes(&[1052]).await.unwrap();
    let found = site
        .search()
        .search_multi_relevance("grand", "", 1, 10)
        .await
        .unwrap();
    assert_eq!(ids(&found), vec!["1052"]);

    events.emit(ContentEvent::Unpublished(1052)).await;
    assert!(cache.get(1052).await.unwrap().is_none());

    site.tree.upsert(pianos.unpublished()).await;
    site.manager.pipeline().reindex_node(1052).await.unwrap();
    let gone = site
        .search()
        .search_multi_relevance("grand", "", 1, 10)
        .await
        .unwrap();
    assert_eq!(gone.error_kind(), Some(SearchErrorKind::NoResults));
}

#[tokio::test]
async fn test_unpublish_leaves_siblings_cached() {
    let cache = Arc::new(MemoryHtmlCache::new());
    let site = Site::with_cache(config(true), cache.clone());
    site.manager.admin().render_all_to_cache().await.unwrap();
    let before = cache.len().await;

    let handlers = site.manager.publish_handlers();
    handlers.handle(&ContentEvent::Trashed(1051)).await.unwrap();
    assert_eq!(cache.len().await, before - 1);
    assert!(cache.get(1051).await.unwrap().is_none());
    assert!(cache.get(1052).await.unwrap().is_some());
}

#[tokio::test]
async fn test_handlers_idle_without_publish_rendering() {
    let cache = Arc::new(MemoryHtmlCache::new());
    let site = Site::with_cache(config(false), cache.clone());
    let events = Events::default();
    assert!(!site.manager.publish_handlers().attach(&events));

    let home = site.tree.get(1050).await.unwrap().unwrap();
    site.manager
        .publish_handlers()
        .handle(&ContentEvent::Published(home))
        .await
        .unwrap();
    assert!(cache.is_empty().await);
}
