//! Paging, the result hook and output documents.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pagesearch_core::SearchConfig;
use pagesearch_fts::{ResultOutput, SearchErrorKind, SearchMode};

use crate::common::{facade, facade_with, params};

fn every_page(page_number: usize, page_length: usize) -> pagesearch_fts::SearchParams {
    let mut request = params(SearchMode::SimpleOr, "guitars pianos");
    request.page_number = page_number;
    request.page_length = page_length;
    request
}

#[tokio::test]
async fn test_second_page_numbers_continue() {
    let search = facade().await;
    let output = search.search(&every_page(2, 3)).await.unwrap();
    let nodes = output.nodes();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].number, 4);

    let summary = output.summary().unwrap();
    assert_eq!(summary.num_results, 4);
    assert_eq!(summary.num_pages, 2);
    assert_eq!(summary.first_result, 4);
    assert_eq!(summary.last_result, 4);
}

#[tokio::test]
async fn test_page_past_end() {
    let search = facade().await;
    let output = search.search(&every_page(3, 3)).await.unwrap();
    assert_eq!(output.error_kind(), Some(SearchErrorKind::NoPage));
    assert!(output.to_xml().contains("no results on page 3"));
}

#[tokio::test]
async fn test_zero_page_length_returns_all() {
    let search = facade().await;
    let output = search.search(&every_page(5, 0)).await.unwrap();
    assert_eq!(output.nodes().len(), 4);
    assert_eq!(output.summary().unwrap().num_pages, 1);
}

#[tokio::test]
async fn test_hook_runs_once_per_emitted_record() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let hook = move |out: &mut ResultOutput<'_>| {
        counter.fetch_add(1, Ordering::SeqCst);
        out.record
            .fields
            .insert("nodeName".to_string(), format!("#{}", out.result_number));
    };
    let search = facade().await.with_observer(Arc::new(hook));

    let output = search.search(&every_page(1, 2)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(output.nodes()[0].title, "#1");
    assert_eq!(output.nodes()[1].title, "#2");
}

#[tokio::test]
async fn test_xml_document_shape() {
    let search = facade().await;
    let output = search
        .search(&params(SearchMode::AsEntered, "grand pianos"))
        .await
        .unwrap();
    let xml = output.to_xml();
    assert!(xml.starts_with("<results><nodes><node id=\"3\""));
    assert!(xml.contains("<data alias=\"FullTextTitle\"><![CDATA[Pianos]]></data>"));
    assert!(xml.contains("numResults=\"1\" numPages=\"1\""));
    assert!(!xml.contains("alias=\"nodeTypeAlias\""));
}

#[tokio::test]
async fn test_return_all_fields() {
    let config = SearchConfig {
        return_all_fields: true,
        ..SearchConfig::default()
    };
    let search = facade_with(config).await;
    let output = search
        .search(&params(SearchMode::AsEntered, "grand pianos"))
        .await
        .unwrap();
    assert_eq!(output.nodes()[0].fields["nodeTypeAlias"], "textPage");
    assert!(output.to_xml().contains("<data alias=\"nodeTypeAlias\"><![CDATA[textPage]]></data>"));

    let json = output.to_json().unwrap();
    assert!(json.contains("\"kind\": \"results\""));
}

#[tokio::test]
async fn test_empty_term() {
    let search = facade().await;
    let output = search.search(&params(SearchMode::SimpleOr, "")).await.unwrap();
    assert_eq!(
        output.to_xml(),
        "<error type=\"NoTerms\"><![CDATA[You must enter a search term]]></error>"
    );
}
