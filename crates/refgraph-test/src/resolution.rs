//! End-to-end resolution over HTTP with the default fetcher.

use refgraph::{
    resolve_many, resolve_one, resolve_one_with_options, RefDescriptor, RefScope, Resolution,
    ResolveOptions, SpecNode,
};
use refgraph_fetch::{FetcherConfig, SourceFetcher};

use crate::server::{schemas_referencing, FixtureServer};

fn fetcher() -> SourceFetcher {
    SourceFetcher::new(FetcherConfig::new().with_allow_plaintext(true))
        .expect("fetcher should build")
}

fn names(resolution: &Resolution) -> Vec<&str> {
    resolution
        .remote_refs
        .iter()
        .map(|r| r.file_name.as_str())
        .collect()
}

/// Local path form of a served document: host, port and path.
fn local(server: &FixtureServer, doc_path: &str) -> String {
    server
        .url(doc_path)
        .trim_start_matches("http://")
        .to_string()
}

#[tokio::test]
async fn remote_cycle_downloads_each_document_once() {
    let server = FixtureServer::start().await.expect("server");
    server
        .serve("/a.yaml", schemas_referencing(&[server.url("/b.yaml"), server.url("/c.yaml")]))
        .await;
    server
        .serve("/b.yaml", schemas_referencing(&[server.url("/a.yaml")]))
        .await;
    server.serve("/c.yaml", schemas_referencing(&[])).await;

    let root = SpecNode::new("root.yaml", schemas_referencing(&[server.url("/a.yaml")]));
    let resolution = resolve_one(root, "e2e", &fetcher()).await.expect("resolves");

    assert_eq!(
        names(&resolution),
        vec![
            local(&server, "/a.yaml"),
            local(&server, "/b.yaml"),
            local(&server, "/c.yaml"),
        ]
    );
    assert!(resolution.is_complete());
    for doc in ["/a.yaml", "/b.yaml", "/c.yaml"] {
        assert_eq!(server.hits(doc).await.expect("hits"), 1, "{doc}");
    }
}

#[tokio::test]
async fn unreachable_documents_are_missing_not_fatal() {
    let server = FixtureServer::start().await.expect("server");
    server.serve_status("/gone.yaml", 404).await;
    server.serve_status("/broken.yaml", 500).await;
    server.serve("/ok.yaml", schemas_referencing(&[])).await;

    let refs = vec![
        server.url("/gone.yaml"),
        server.url("/ok.yaml"),
        server.url("/broken.yaml"),
    ];
    let root = SpecNode::new("root.yaml", schemas_referencing(&refs));
    let resolution = resolve_one(root, "e2e", &fetcher()).await.expect("resolves");

    assert_eq!(names(&resolution), vec![local(&server, "/ok.yaml")]);
    let mut missing = resolution.missing_remote_refs.clone();
    missing.sort();
    let mut expected = vec![
        RefDescriptor::new(server.url("/broken.yaml")),
        RefDescriptor::new(server.url("/gone.yaml")),
    ];
    expected.sort();
    assert_eq!(missing, expected);
}

#[tokio::test]
async fn malformed_remote_document_aborts() {
    let server = FixtureServer::start().await.expect("server");
    server.serve("/bad.yaml", "components: [unclosed").await;

    let root = SpecNode::new("root.yaml", schemas_referencing(&[server.url("/bad.yaml")]));
    let err = resolve_one(root, "e2e", &fetcher()).await.unwrap_err();

    assert!(err.to_string().contains("E2002"), "got: {err}");
}

#[tokio::test]
async fn relative_refs_inside_remote_documents_join_the_parent_url() {
    let server = FixtureServer::start().await.expect("server");
    server
        .serve("/models/pet.yaml", schemas_referencing(&["./owner.yaml".to_string()]))
        .await;
    server.serve("/models/owner.yaml", schemas_referencing(&[])).await;
    let root = || SpecNode::new("root.yaml", schemas_referencing(&[server.url("/models/pet.yaml")]));

    let remote_only = resolve_one(root(), "e2e", &fetcher()).await.expect("resolves");
    assert_eq!(names(&remote_only), vec![local(&server, "/models/pet.yaml")]);

    let options = ResolveOptions::new().with_scope(RefScope::RemoteAndExternal);
    let followed = resolve_one_with_options(root(), "e2e", &fetcher(), &options)
        .await
        .expect("resolves");
    assert_eq!(
        names(&followed),
        vec![
            local(&server, "/models/pet.yaml"),
            local(&server, "/models/owner.yaml"),
        ]
    );
    assert_eq!(server.hits("/models/owner.yaml").await.expect("hits"), 1);
}

#[tokio::test]
async fn many_roots_resolve_independently() {
    let server = FixtureServer::start().await.expect("server");
    server.serve("/shared.yaml", schemas_referencing(&[])).await;

    let roots = vec![
        SpecNode::new("one.yaml", schemas_referencing(&[server.url("/shared.yaml")])),
        SpecNode::new("empty.yaml", ""),
        SpecNode::new("two.yaml", schemas_referencing(&[server.url("/shared.yaml")])),
    ];
    let results = resolve_many(roots, "e2e", &fetcher()).await.expect("resolves");

    let roots: Vec<&str> = results
        .iter()
        .map(|r| r.spec_root.file_name.as_str())
        .collect();
    assert_eq!(roots, vec!["one.yaml", "two.yaml"]);
    assert_eq!(server.hits("/shared.yaml").await.expect("hits"), 2);
}
