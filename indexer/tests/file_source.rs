use indexer::FileSource;
use search_core::{DocumentSource, FetchError, SearchEngine};
use std::fs;
use tempfile::tempdir;

#[test]
fn loads_json_array_and_object() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a.json"),
        r#"[{"id":"1","text":"Berlin is a city"},{"id":"2","body":"paris is the capital of France"}]"#,
    )
    .unwrap();
    fs::write(dir.path().join("b.json"), r#"{"id":"3","message":"I love Paris in the spring","user_name":"Jane"}"#)
        .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let docs = FileSource::new(dir.path()).load().unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(docs[2].author.as_deref(), Some("Jane"));
}

#[test]
fn loads_jsonl_skipping_blank_lines() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("corpus.jsonl");
    fs::write(&file, "{\"id\":\"a\",\"text\":\"harbor\"}\n\n{\"id\":\"b\",\"text\":\"bridge\"}\n").unwrap();

    let docs = FileSource::new(&file).load().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1].text, "bridge");
}

#[test]
fn reports_malformed_lines_with_location() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("bad.jsonl");
    fs::write(&file, "{\"id\":\"a\",\"text\":\"ok\"}\nnot json\n").unwrap();

    match FileSource::new(&file).load() {
        Err(FetchError::Malformed(msg)) => assert!(msg.contains("bad.jsonl:2"), "{msg}"),
        other => panic!("expected malformed error, got {other:?}"),
    }
}

#[test]
fn missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(FileSource::new(dir.path().join("nope")).load(), Err(FetchError::Io(_))));
}

#[tokio::test]
async fn feeds_the_engine_as_a_document_source() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("corpus.jsonl"),
        "{\"id\":\"doc1\",\"text\":\"paris is the capital of France\"}\n\
         {\"id\":\"doc2\",\"text\":\"I love Paris in the spring\"}\n\
         {\"id\":\"doc3\",\"text\":\"Berlin is a city\"}\n",
    )
    .unwrap();

    let docs = FileSource::new(dir.path()).fetch().await.unwrap();
    let engine = SearchEngine::default();
    engine.ingest(docs).unwrap();
    let hits: Vec<String> = engine.query("paris", 10).unwrap().hits.into_iter().map(|h| h.id).collect();
    assert_eq!(hits, vec!["doc1", "doc2"]);
}
