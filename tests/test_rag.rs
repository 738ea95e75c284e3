//! Integration tests for the document assistant over the shipped `docs/`
//! folder, using the offline hashing embedder and the echo provider.

use std::path::Path;

use tempfile::TempDir;

use smartqa::config::Config;
use smartqa::llm::LlmProvider;
use smartqa::llm::providers::dummy::DummyProvider;
use smartqa::subsystems::rag::RagService;

fn service(dir: &TempDir) -> RagService {
    let config = Config::test_default(dir.path());
    RagService::open(&config, LlmProvider::Dummy(DummyProvider)).expect("open rag service")
}

#[tokio::test]
async fn shipped_docs_are_indexed_once() {
    let dir = TempDir::new().unwrap();
    let rag = service(&dir);

    let report = rag.index_dir(Path::new("docs")).await.unwrap();
    assert_eq!(report.files, 3);
    assert_eq!(report.inserted, 10);
    assert_eq!(report.skipped, 0);

    let again = rag.index_dir(Path::new("docs")).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.unchanged, 10);

    let stats = rag.stats().await;
    assert_eq!(stats.count, 10);
    assert_eq!(stats.sources, vec!["credit_cards.txt", "deposits.txt", "loans.txt"]);
}

#[tokio::test]
async fn search_returns_requested_number_of_paragraphs() {
    let dir = TempDir::new().unwrap();
    let rag = service(&dir);
    rag.index_dir(Path::new("docs")).await.unwrap();

    let hits = rag.search("大额存单起存金额", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].score >= hits[1].score);
    assert!(hits.iter().all(|h| h.id.starts_with(&h.metadata.source)));
}

#[tokio::test]
async fn answer_prompt_carries_retrieved_context() {
    let dir = TempDir::new().unwrap();
    let rag = service(&dir);
    rag.index_dir(Path::new("docs")).await.unwrap();

    let out = rag.ask("信用卡年费", Some(3)).await.unwrap();
    assert_eq!(out.docs.len(), 3);
    // The echo provider returns the rendered prompt.
    assert!(out.answer.contains("以下是背景知识"));
    assert!(out.answer.contains("信用卡年费"));
    for doc in &out.docs {
        assert!(out.answer.contains(doc.as_str()));
    }
    assert!(out.elapsed >= 0.0);
}

#[tokio::test]
async fn index_survives_restart() {
    let dir = TempDir::new().unwrap();
    service(&dir).index_dir(Path::new("docs")).await.unwrap();
    assert_eq!(service(&dir).stats().await.count, 10);
}
