//! End-to-end tests of the HTTP surface, driven through `Router::dispatch`
//! against a throwaway pastes directory.

use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;
use tsubin::{AppState, Config, Method, PasteStore, Request, Response, Router, SharedConfig, api};

struct Harness {
    _dir: TempDir,
    pastes: PathBuf,
    app: Router<AppState>,
}

fn harness(config: Config) -> Harness {
    let dir = TempDir::new().unwrap();
    let pastes = dir.path().join("pastes");
    let state = AppState {
        store: PasteStore::open(&pastes).unwrap(),
        config: SharedConfig::new(config),
    };
    Harness { _dir: dir, pastes, app: api::router(state) }
}

fn form(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish()
}

fn json(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

impl Harness {
    async fn create(&self, content: &str, expiration: &str) -> Value {
        let req = Request::new(Method::Post, "/paste/create")
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body(form(&[("content", content), ("expiration", expiration)]));
        let res = self.app.dispatch(req).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.header("content-type"), Some("application/json"));
        json(&res)
    }

    async fn get(&self, path: &str) -> Response {
        self.app.dispatch(Request::new(Method::Get, path)).await
    }

    fn file(&self, id: &str) -> PathBuf {
        self.pastes.join(format!("{id}.txt"))
    }
}

#[tokio::test]
async fn create_and_read_one_day_paste() {
    let h = harness(Config::default());

    let reply = h.create("hello", "1_day").await;
    assert_eq!(reply["status"], "ok");
    assert_eq!(reply["paste"], "qvTGHdzF6KLavt4PO0gs2a6pQ00");

    let res = h.get("/api/paste/qvTGHdzF6KLavt4PO0gs2a6pQ00").await;
    assert_eq!(res.status_code(), 200);
    let view = json(&res);
    assert_eq!(view["content"], "hello");
    assert_eq!(view["keepAlive"], true);
    assert_eq!(view["burnAfterReading"], false);
    assert_eq!(view["expiration"], "in 23 h");

    let page = h.get("/paste/qvTGHdzF6KLavt4PO0gs2a6pQ00").await;
    assert_eq!(page.status_code(), 200);
    let html = String::from_utf8_lossy(page.body());
    assert!(html.contains("<pre>hello</pre>"));
    assert!(html.contains("Expires in 23 h."));
}

#[tokio::test]
async fn multi_line_content_survives() {
    let h = harness(Config::default());
    let content = "fn main() {\n    println!(\"<hi>\");\n}\n";
    let id = h.create(content, "never").await["paste"].as_str().unwrap().to_owned();

    let view = json(&h.get(&format!("/api/paste/{id}")).await);
    assert_eq!(view["content"], content);
    assert!(view["expiration"].as_str().unwrap().starts_with("on "));

    let html = String::from_utf8_lossy(h.get(&format!("/paste/{id}")).await.body()).into_owned();
    assert!(html.contains("println!(&quot;&lt;hi&gt;&quot;);"));
}

#[tokio::test]
async fn burn_after_reading_survives_the_creation_redirect() {
    let h = harness(Config::default());
    let id = h.create("top secret", "burnAfterReading").await["paste"].as_str().unwrap().to_owned();

    let view = json(&h.get(&format!("/api/paste/{id}")).await);
    assert_eq!(view["content"], "top secret");
    assert_eq!(view["burnAfterReading"], true);
    assert_eq!(view["keepAlive"], true);
    assert_eq!(view["expiration"], Value::Null);
    assert!(h.file(&id).exists());
}

#[tokio::test]
async fn oversized_content_is_rejected() {
    let h = harness(Config { max_size: 8, ..Config::default() });

    let reply = h.create("123456789", "1_day").await;
    assert_eq!(reply["status"], "error");
    assert_eq!(reply["message"], "Content too big");
    assert_eq!(std::fs::read_dir(&h.pastes).unwrap().count(), 0);

    assert_eq!(h.create("12345678", "1_day").await["status"], "ok");
}

#[tokio::test]
async fn max_size_follows_live_config() {
    let h = harness(Config { max_size: 4, ..Config::default() });
    assert_eq!(h.create("hello", "1_day").await["status"], "error");

    h.app.state().config.replace(Config { max_size: 64, ..Config::default() });
    assert_eq!(h.create("hello", "1_day").await["status"], "ok");
}

#[tokio::test]
async fn unknown_policy_expires_on_first_read() {
    let h = harness(Config::default());
    let id = h.create("fleeting", "1_week").await["paste"].as_str().unwrap().to_owned();
    assert!(h.file(&id).exists());

    assert_eq!(h.get(&format!("/api/paste/{id}")).await.status_code(), 404);
    assert!(!h.file(&id).exists());
}

#[tokio::test]
async fn invalid_and_missing_ids_look_the_same() {
    let h = harness(Config::default());
    let invalid = h.get("/paste/abc.def").await;
    let missing = h.get("/paste/abcdef").await;

    assert_eq!(invalid.status_code(), 404);
    assert_eq!(missing.status_code(), 404);
    assert_eq!(invalid.body(), missing.body());

    let api = json(&h.get("/api/paste/..").await);
    assert_eq!(api["message"], "Not found");
}

#[tokio::test]
async fn redirects_and_pages() {
    let h = harness(Config::default());

    for path in ["/", "/paste/create"] {
        let res = h.get(path).await;
        assert_eq!(res.status_code(), 302, "{path}");
        assert_eq!(res.header("location"), Some("/new/"));
    }

    let form = h.get("/new/").await;
    assert_eq!(form.status_code(), 200);
    assert!(String::from_utf8_lossy(form.body()).contains("action=\"/paste/create\""));

    let lost = h.get("/no/such/page").await;
    assert_eq!(lost.status_code(), 404);
    assert!(String::from_utf8_lossy(lost.body()).contains("Paste not found"));

    let wrong_method = h.app.dispatch(Request::new(Method::Delete, "/new/")).await;
    assert_eq!(wrong_method.status_code(), 405);

    let head = h.app.dispatch(Request::new(Method::Head, "/new/")).await;
    assert_eq!(head.status_code(), 200);
}

#[tokio::test]
async fn form_encoding_edge_cases_decode() {
    let h = harness(Config::default());
    let content = "a+b=c&d %25 ünï\r\n\ttab";
    let id = h.create(content, "1_day").await["paste"].as_str().unwrap().to_owned();
    assert_eq!(json(&h.get(&format!("/api/paste/{id}")).await)["content"], content);
}

#[tokio::test]
async fn health_probes() {
    let h = harness(Config::default());
    assert_eq!(h.get("/healthz").await.body(), b"ok");
    assert_eq!(h.get("/readyz").await.body(), b"ready");

    std::fs::remove_dir_all(&h.pastes).unwrap();
    assert_eq!(h.get("/readyz").await.status_code(), 503);
}

#[tokio::test]
async fn debug_access_log_does_not_change_responses() {
    let h = harness(Config { debug: true, ..Config::default() });
    let id = h.create("logged", "1_month").await["paste"].as_str().unwrap().to_owned();
    assert_eq!(h.get(&format!("/api/paste/{id}")).await.status_code(), 200);
}
