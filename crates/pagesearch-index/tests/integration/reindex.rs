//! Admin verbs feeding the search façade.

use std::sync::Arc;

use pagesearch_fts::SearchErrorKind;
use pagesearch_index::{HtmlCache, IndexReport, RedbHtmlCache};

use crate::common::{Site, config, ids};

#[tokio::test]
async fn test_reindex_all_then_search() {
    let site = Site::new(config(false));
    let report = site.manager.admin().reindex_all().await.unwrap();
    assert_eq!(
        report,
        IndexReport {
            indexed: 4,
            skipped: 1,
            failed: 0
        }
    );
    assert_eq!(site.index.len().await, 4);

    let search = site.search();
    let everywhere = search
        .search_multi_relevance("guitars", "", 1, 10)
        .await
        .unwrap();
    assert_eq!(ids(&everywhere), vec!["1051", "1060"]);

    let under_home = search
        .search_multi_relevance("guitars", "1050", 1, 10)
        .await
        .unwrap();
    assert_eq!(ids(&under_home), vec!["1051"]);
}

#[tokio::test]
async fn test_hidden_section_and_navigation_stay_out() {
    let site = Site::new(config(false));
    site.manager.admin().reindex_all().await.unwrap();
    assert!(site.index.document("1053").await.is_none());
    assert!(site.index.document("1054").await.is_none());

    let home = site.index.document("1050").await.unwrap();
    assert_eq!(home["FullTextSearch"], "Home Welcome to the music shop");
    assert_eq!(home["FullTextPath"], "1050");

    let output = site
        .search()
        .search_as_entered("secret", "", 1, 10)
        .await
        .unwrap();
    assert_eq!(output.error_kind(), Some(SearchErrorKind::NoResults));
}

#[tokio::test]
async fn test_rebuild_with_prerender_into_redb() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(RedbHtmlCache::open(dir.path().join("cache.redb")).unwrap());
    let site = Site::with_cache(config(true), cache.clone());

    let report = site.manager.admin().rebuild_index().await.unwrap();
    assert_eq!(report.indexed, 4);

    // The hidden page loses its row; render-to-cache does not prune below it.
    assert!(cache.get(1053).await.unwrap().is_none());
    assert!(cache.get(1054).await.unwrap().is_some());
    assert_eq!(cache.len().unwrap(), 5);

    let pianos = site.index.document("1052").await.unwrap();
    assert_eq!(pianos["FullTextSearch"], "Pianos Grand pianos");
}

#[tokio::test]
async fn test_reindex_subtree_only_touches_descendants() {
    let site = Site::new(config(false));
    let report = site
        .manager
        .admin()
        .reindex_nodes_and_descendants(&[1060])
        .await
        .unwrap();
    assert_eq!(report.indexed, 1);
    assert_eq!(site.index.len().await, 1);
}
