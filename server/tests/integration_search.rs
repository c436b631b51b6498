use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use engine::persist::{save_context, ArtifactPaths};
use engine::{CorpusDoc, EngineConfig, SearchContext};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn doc(id: &str, text: &str) -> CorpusDoc {
    CorpusDoc {
        id: id.to_string(),
        text: text.to_string(),
    }
}

fn build_tiny_artifacts(dir: &std::path::Path, corpus: Vec<CorpusDoc>) {
    let context = SearchContext::build(corpus, Vec::new(), EngineConfig::default());
    let paths = ArtifactPaths::new(dir);
    save_context(&paths, &context, "2024-01-01T00:00:00Z".to_string()).unwrap();
}

fn tiny_corpus() -> Vec<CorpusDoc> {
    vec![
        doc("alpha.txt", "the cat sat on the mat"),
        doc("beta.txt", "the cat ran far away today"),
        doc("gamma.txt", "dogs bark loudly tonight"),
    ]
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_corpus_shape() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["corpus_size"], 3);
    assert_eq!(json["graph_nodes"], 3);
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/search?query=cat&ranking=hybrid")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    let results = json["results"].as_array().unwrap();
    // alpha and beta tie on occurrences and authority: id order.
    assert_eq!(results[0]["doc_id"], "alpha.txt");
    assert_eq!(results[1]["doc_id"], "beta.txt");
}

#[tokio::test]
async fn unknown_term_is_empty_success() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/search?query=zebra")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn empty_query_is_bad_request() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/search?query=%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn advanced_search_matches_vocabulary_terms() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/advanced-search?regex=%5Eca")).await;
    assert_eq!(status, StatusCode::OK);
    let terms = json["matched_terms"].as_array().unwrap();
    assert!(terms.iter().any(|t| t == "cat"));
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn invalid_regex_is_bad_request() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/advanced-search?regex=%28open")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("invalid pattern"));
}

#[tokio::test]
async fn book_info_and_not_found() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();
    let (status, json) = call(app.clone(), get("/book/gamma.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["graph_degree"], 0);
    assert_eq!(json["in_graph"], true);

    let (status, _) = call(app, get("/book/missing.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_exposes_density_and_top_authority() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["vocabulary_size"].as_u64().unwrap() > 0);
    assert_eq!(json["top_authority"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn suggestions_round_trip() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = call(app, get("/suggestions?query=sat&top_n=3")).await;
    assert_eq!(status, StatusCode::OK);
    let top = json["top_results"].as_array().unwrap();
    assert_eq!(top[0]["doc_id"], "alpha.txt");
    let suggested = json["suggestions"].as_array().unwrap();
    assert!(suggested.iter().any(|s| s["doc_id"] == "beta.txt"));
}

#[tokio::test]
async fn reload_swaps_in_rebuilt_artifacts() {
    let dir = tempdir().unwrap();
    build_tiny_artifacts(dir.path(), tiny_corpus());
    std::env::set_var("ADMIN_TOKEN", "secret");
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (_, before) = call(app.clone(), get("/health")).await;
    assert_eq!(before["corpus_size"], 3);

    // Rebuild the artifact directory with a larger corpus, then swap.
    let mut corpus = tiny_corpus();
    corpus.push(doc("delta.txt", "entirely fresh words appear here"));
    build_tiny_artifacts(dir.path(), corpus);

    let unauthorized = Request::post("/admin/reload").body(Body::empty()).unwrap();
    let (status, _) = call(app.clone(), unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let authorized = Request::post("/admin/reload")
        .header("X-ADMIN-TOKEN", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, json) = call(app.clone(), authorized).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reloaded"], true);

    let (_, after) = call(app, get("/health")).await;
    assert_eq!(after["corpus_size"], 4);
}
