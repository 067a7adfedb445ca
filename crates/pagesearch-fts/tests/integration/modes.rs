//! Each search mode over the fixture site.

use pagesearch_fts::{SearchErrorKind, SearchMode};

use crate::common::{facade, ids, params};

#[tokio::test]
async fn test_multi_relevance_ranks_phrase_first() {
    let search = facade().await;
    let output = search
        .search(&params(SearchMode::MultiRelevance, "electric guitars"))
        .await
        .unwrap();
    assert_eq!(ids(&output), vec!["1", "2", "4"]);
    assert_eq!(output.nodes()[0].number, 1);
    assert!(output.nodes()[0].score > output.nodes()[1].score);
}

#[tokio::test]
async fn test_multi_and_requires_every_word() {
    let search = facade().await;
    let any = search
        .search(&params(SearchMode::MultiRelevance, "electric basses"))
        .await
        .unwrap();
    assert_eq!(any.summary().unwrap().num_results, 3);

    let all = search
        .search(&params(SearchMode::MultiAnd, "electric basses"))
        .await
        .unwrap();
    assert_eq!(ids(&all), vec!["1"]);
}

#[tokio::test]
async fn test_simple_or_matches_any_word() {
    let search = facade().await;
    let output = search
        .search(&params(SearchMode::SimpleOr, "pianos lessons"))
        .await
        .unwrap();
    let mut found = ids(&output);
    found.sort_unstable();
    assert_eq!(found, vec!["3", "4"]);
}

#[tokio::test]
async fn test_as_entered_matches_whole_phrase() {
    let search = facade().await;
    let output = search
        .search(&params(SearchMode::AsEntered, "electric guitars"))
        .await
        .unwrap();
    assert_eq!(ids(&output), vec!["1"]);

    let reversed = search
        .search(&params(SearchMode::AsEntered, "guitars electric"))
        .await
        .unwrap();
    assert_eq!(reversed.error_kind(), Some(SearchErrorKind::NoResults));
}

#[tokio::test]
async fn test_root_nodes_restrict_to_subtree() {
    let search = facade().await;
    let mut request = params(SearchMode::MultiRelevance, "guitars");
    request.root_nodes = "1060".to_string();
    let output = search.search(&request).await.unwrap();
    assert_eq!(ids(&output), vec!["4"]);

    request.root_nodes = "-1".to_string();
    let everywhere = search.search(&request).await.unwrap();
    assert_eq!(everywhere.nodes().len(), 3);
}

#[tokio::test]
async fn test_fuzzy_short_form_finds_near_misses() {
    let search = facade().await;
    let output = search
        .search_multi_relevance("guitar", "", 0, 0)
        .await
        .unwrap();
    assert_eq!(output.nodes().len(), 3);
}

#[tokio::test]
async fn test_escaped_input_cannot_change_structure() {
    let search = facade().await;
    let output = search
        .search(&params(SearchMode::MultiRelevance, "nodeName:Pianos"))
        .await
        .unwrap();
    assert_eq!(output.error_kind(), Some(SearchErrorKind::NoResults));
}

#[tokio::test]
async fn test_highlighted_summary_and_plain_title() {
    let search = facade().await;
    let mut request = params(SearchMode::MultiRelevance, "basses");
    request.use_highlighting = true;
    let output = search.search(&request).await.unwrap();
    let node = &output.nodes()[0];
    assert_eq!(node.title, "Electric Guitars");
    assert_eq!(
        node.summary,
        "We sell electric guitars and <strong>basses</strong>"
    );
}
