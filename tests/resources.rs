use std::time::Duration;

use serde_json::json;
use typesense_dispatch::resources::SearchParameters;
use typesense_dispatch::{Client, Configuration, Error};
use wiremock::matchers::{body_json, body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Client {
    let config = Configuration::new([server.uri()], "secret")
        .with_retries(2)
        .with_retry_interval(Duration::from_millis(10))
        .with_healthcheck_interval(Duration::from_secs(3600));
    Client::new(config).unwrap()
}

#[tokio::test]
async fn test_collection_create_and_retrieve() {
    let server = MockServer::start().await;
    let schema = json!({
        "name": "companies",
        "fields": [{"name": "company_name", "type": "string"}]
    });

    Mock::given(method("POST"))
        .and(path("/collections"))
        .and(body_json(&schema))
        .respond_with(ResponseTemplate::new(201).set_body_json(&schema))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&schema))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.collections().create(&schema).await.unwrap(), schema);
    assert_eq!(
        client.collection("companies").retrieve().await.unwrap(),
        Some(schema)
    );
    assert_eq!(client.collection("missing").retrieve().await.unwrap(), None);
}

#[tokio::test]
async fn test_document_actions() {
    let server = MockServer::start().await;
    for action in ["create", "upsert", "update"] {
        Mock::given(method("POST"))
            .and(path("/collections/books/documents"))
            .and(query_param("action", action))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"action": action})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client(&server);
    let documents = client.collection("books").documents();
    let doc = json!({"id": "1", "title": "Dune"});

    assert_eq!(documents.create(&doc).await.unwrap()["action"], "create");
    assert_eq!(documents.upsert(&doc).await.unwrap()["action"], "upsert");
    assert_eq!(documents.update(&doc).await.unwrap()["action"], "update");
}

#[tokio::test]
async fn test_document_create_then_retrieve_round_trips() {
    let server = MockServer::start().await;
    let doc = json!({
        "id": "A",
        "company_name": "Stark Industries",
        "num_employees": 5215,
        "country": "USA"
    });

    Mock::given(method("POST"))
        .and(path("/collections/companies/documents"))
        .and(query_param("action", "create"))
        .and(body_json(&doc))
        .respond_with(ResponseTemplate::new(201).set_body_json(&doc))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/companies/documents/A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&doc))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let documents = client.collection("companies").documents();

    let created = documents.create(&doc).await.unwrap();
    assert_eq!(created, doc);

    let fetched = documents.get("A").retrieve().await.unwrap();
    assert_eq!(fetched, Some(doc));
}

#[tokio::test]
async fn test_single_document() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/collections/books/documents/1"))
        .and(body_json(json!({"title": "Dune Messiah"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/books/documents/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    let documents = client.collection("books").documents();
    documents
        .get("1")
        .update(&json!({"title": "Dune Messiah"}))
        .await
        .unwrap();
    assert!(documents.get("2").retrieve().await.unwrap().is_none());
}

#[tokio::test]
async fn test_import_is_newline_delimited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections/books/documents/import"))
        .and(query_param("action", "upsert"))
        .and(body_string("{\"id\":\"1\"}\n{\"id\":\"2\"}"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\"success\":true}\n{\"success\":false,\"error\":\"Bad JSON.\"}",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let results = client
        .collection("books")
        .documents()
        .import(&[json!({"id": "1"}), json!({"id": "2"})], &[("action", "upsert")])
        .await
        .unwrap();

    assert_eq!(
        results,
        vec![
            json!({"success": true}),
            json!({"success": false, "error": "Bad JSON."})
        ]
    );
}

#[tokio::test]
async fn test_import_nothing_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(path("/collections/books/documents/import"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    let empty: Vec<serde_json::Value> = Vec::new();
    let results = client
        .collection("books")
        .documents()
        .create_many(&empty, &[])
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_export_returns_raw_lines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/books/documents/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":\"1\"}\n{\"id\":\"2\"}"))
        .mount(&server)
        .await;

    let client = client(&server);
    let exported = client.collection("books").documents().export().await.unwrap();
    assert_eq!(&exported[..], b"{\"id\":\"1\"}\n{\"id\":\"2\"}");
}

#[tokio::test]
async fn test_search_sends_only_set_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/books/documents/search"))
        .and(query_param("q", "dune"))
        .and(query_param("query_by", "title,author"))
        .and(query_param("prefix", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"found": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let params = SearchParameters {
        prefix: Some(false),
        ..SearchParameters::new("dune").query_by(["title", "author"])
    };
    let result = client
        .collection("books")
        .documents()
        .search(&params)
        .await
        .unwrap();
    assert_eq!(result["found"], 1);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("filter_by"));
}

#[tokio::test]
async fn test_delete_by_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/collections/books/documents"))
        .and(query_param("filter_by", "year:<1900"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"num_deleted": 4})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let result = client
        .collection("books")
        .documents()
        .delete(&[("filter_by", "year:<1900")])
        .await
        .unwrap();
    assert_eq!(result["num_deleted"], 4);
}

#[tokio::test]
async fn test_alias_and_curation_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/aliases/books"))
        .and(body_json(json!({"collection_name": "books_v2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "books"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/collections/books/synonyms/coat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "coat"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/collections/books/overrides/pin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "pin"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analytics/rules/popular"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .alias("books")
        .upsert(&json!({"collection_name": "books_v2"}))
        .await
        .unwrap();
    client
        .collection("books")
        .synonyms()
        .get("coat")
        .upsert(&json!({"synonyms": ["coat", "jacket"]}))
        .await
        .unwrap();
    client
        .collection("books")
        .overrides()
        .get("pin")
        .delete()
        .await
        .unwrap();
    assert!(client
        .analytics_rule("popular")
        .retrieve()
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_cluster_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .and(body_json(json!({"log-slow-requests-time-ms": 2000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metrics.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"system_memory_used_bytes": "1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"latency_ms": {}})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/operations/cache/clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/multi_search"))
        .and(query_param("query_by", "title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.log_slow_requests(2000).await.unwrap()["success"], true);
    assert!(client.metrics().await.unwrap().get("system_memory_used_bytes").is_some());
    assert!(client.stats().await.unwrap().get("latency_ms").is_some());
    client.operations().perform("cache/clear", &[]).await.unwrap();
    client
        .multi_search()
        .perform(
            &json!({"searches": [{"collection": "books", "q": "dune"}]}),
            &[("query_by", "title")],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health_check_and_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(!client.health().check().await.unwrap());
    assert!(
        client
            .health()
            .wait(Duration::from_secs(2), Duration::from_millis(20))
            .await
    );
}

#[tokio::test]
async fn test_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/keys"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7, "value": "abcd"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/keys/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let client = client(&server);
    let created = client
        .keys()
        .create(&json!({"actions": ["documents:search"], "collections": ["*"]}))
        .await
        .unwrap();
    assert_eq!(created["id"], 7);

    assert_eq!(client.key(7).retrieve().await.unwrap(), None);

    let scoped = client
        .keys()
        .generate_scoped_search_key("abcd", &json!({"filter_by": "user_id:1"}))
        .unwrap();
    assert!(!scoped.is_empty());
}

#[tokio::test]
async fn test_required_resource_missing_names_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.metrics().await.unwrap_err();
    assert!(matches!(err, Error::ObjectNotFound(ref endpoint) if endpoint == "/metrics.json"));
    assert_eq!(client.dispatcher().pool().len(), 1);
}
