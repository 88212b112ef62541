//! End-to-end scenarios (spec.md §8 S1–S7), run against a real Chromium.
//!
//! These require `chrome --headless --remote-debugging-port=9222` (or
//! equivalent) running locally and are `#[ignore]`d by default — there is
//! no CI browser available to this crate. Point `CDP_URL` at the
//! remote-debugging origin (default `http://127.0.0.1:9222`) and run with
//! `cargo test --test live_scenarios -- --ignored`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use kuromi_browser_core::page::WaitUntil;
use kuromi_browser_core::Browser;

fn cdp_url() -> String {
    std::env::var("CDP_URL").unwrap_or_else(|_| "http://127.0.0.1:9222".to_string())
}

/// A minimal single-threaded HTTP/1.1 server for the fixed set of routes a
/// scenario needs. No framework dependency pulled in for this alone — the
/// routes are static and the protocol subset is tiny.
struct TestServer {
    port: u16,
}

impl TestServer {
    fn start(routes: Vec<(&'static str, &'static str, Vec<u8>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let route = read_request_path(&mut stream);
                let served = routes.iter().find(|(path, _, _)| *path == route);
                match served {
                    Some((_, content_type, body)) => {
                        write_response(&mut stream, 200, content_type, body)
                    }
                    None => write_response(&mut stream, 404, "text/plain", b"not found"),
                }
            }
        });
        Self { port }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

fn read_request_path(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).unwrap_or(0);
    let req = String::from_utf8_lossy(&buf[..n]);
    req.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string()
}

fn write_response(stream: &mut TcpStream, status: u16, content_type: &str, body: &[u8]) {
    let reason = if status == 200 { "OK" } else { "Not Found" };
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}

#[tokio::test]
#[ignore]
async fn s1_goto_and_ready_state() {
    let server = TestServer::start(vec![(
        "/",
        "text/html",
        b"<!doctype html><title>T</title><body>hi".to_vec(),
    )]);
    let browser = Browser::connect(&cdp_url()).await.unwrap();
    let page = browser.new_page("about:blank").await.unwrap();

    let final_url = page
        .goto(&server.url("/"), WaitUntil::Load, Duration::from_secs(10))
        .await
        .unwrap();
    assert!(final_url.contains(&server.url("/")) || final_url == server.url("/"));

    let ready_state = page.evaluate("document.readyState", false, true).await.unwrap();
    assert_eq!(ready_state, serde_json::json!("complete"));

    let title = page.evaluate("document.title", false, true).await.unwrap();
    assert_eq!(title, serde_json::json!("T"));
}

#[tokio::test]
#[ignore]
async fn s2_selector_shortcuts_agree_on_backend_node_id() {
    let server = TestServer::start(vec![(
        "/",
        "text/html",
        br#"<!doctype html><body><input id="q" name="email" placeholder="e"></body>"#.to_vec(),
    )]);
    let browser = Browser::connect(&cdp_url()).await.unwrap();
    let page = browser.new_page("about:blank").await.unwrap();
    page.goto(&server.url("/"), WaitUntil::Load, Duration::from_secs(10))
        .await
        .unwrap();

    let by_id = page.find_element("#q").await.unwrap();
    let by_name = page.find_element("@name=email").await.unwrap();
    let by_placeholder = page.find_element("@placeholder").await.unwrap();
    let by_tag = page.find_element("t:input").await.unwrap();

    assert_eq!(by_id.backend_node_id(), by_name.backend_node_id());
    assert_eq!(by_id.backend_node_id(), by_placeholder.backend_node_id());
    assert_eq!(by_id.backend_node_id(), by_tag.backend_node_id());
}

#[tokio::test]
#[ignore]
async fn s3_shadow_pierce_finds_slotted_button() {
    let server = TestServer::start(vec![(
        "/",
        "text/html",
        br#"<!doctype html><body><my-widget></my-widget>
<script>
customElements.define('my-widget', class extends HTMLElement {
  connectedCallback() {
    const root = this.attachShadow({mode: 'open'});
    root.innerHTML = '<button class="go">Go</button>';
  }
});
</script></body>"#
            .to_vec(),
    )]);
    let browser = Browser::connect(&cdp_url()).await.unwrap();
    let page = browser.new_page("about:blank").await.unwrap();
    page.goto(&server.url("/"), WaitUntil::Load, Duration::from_secs(10))
        .await
        .unwrap();

    let buttons = page.dom().pierce_shadow(".go").await.unwrap();
    let button = buttons.into_iter().next().expect("shadow button found");
    assert_eq!(button.text_content().await.unwrap(), "Go");
}

#[tokio::test]
#[ignore]
async fn s4_network_idle_waits_for_trailing_xhr() {
    let server = TestServer::start(vec![
        (
            "/",
            "text/html",
            br#"<!doctype html><body><script>
setTimeout(() => fetch('/ping'), 200);
</script></body>"#
                .to_vec(),
        ),
        ("/ping", "text/plain", b"pong".to_vec()),
    ]);
    let browser = Browser::connect(&cdp_url()).await.unwrap();
    let page = browser.new_page("about:blank").await.unwrap();

    let start = std::time::Instant::now();
    page.goto(
        &server.url("/"),
        WaitUntil::NetworkIdle,
        Duration::from_secs(10),
    )
    .await
    .unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(600));
    assert!(elapsed <= Duration::from_millis(1800));
}

#[tokio::test]
#[ignore]
async fn s5_mock_rule_short_circuits_fetch() {
    use kuromi_browser_core::network::InterceptRule;
    use kuromi_browser_core::network::interceptor::{InterceptAction, MockResponse};

    let server = TestServer::start(vec![(
        "/",
        "text/html",
        b"<!doctype html><body>mock test".to_vec(),
    )]);
    let browser = Browser::connect(&cdp_url()).await.unwrap();
    let page = browser.new_page("about:blank").await.unwrap();
    page.enable_interception(vec![InterceptRule {
        pattern: "*api/ping*".to_string(),
        action: InterceptAction::Mock(MockResponse {
            status: 418,
            headers: vec![],
            body: b"teapot".to_vec(),
        }),
        priority: 0,
    }])
    .await
    .unwrap();

    page.goto(&server.url("/"), WaitUntil::Load, Duration::from_secs(10))
        .await
        .unwrap();
    let result = page
        .evaluate(
            "fetch('/api/ping').then(r => r.text().then(t => r.status + ':' + t))",
            true,
            true,
        )
        .await
        .unwrap();
    assert_eq!(result, serde_json::json!("418:teapot"));
}

#[tokio::test]
#[ignore]
async fn s6_block_rule_zeroes_out_resource_entry() {
    use kuromi_browser_core::network::InterceptRule;
    use kuromi_browser_core::network::interceptor::InterceptAction;

    let server = TestServer::start(vec![(
        "/",
        "text/html",
        br#"<!doctype html><body><img src="x.png"></body>"#.to_vec(),
    )]);
    let browser = Browser::connect(&cdp_url()).await.unwrap();
    let page = browser.new_page("about:blank").await.unwrap();
    page.enable_interception(vec![InterceptRule {
        pattern: "*.png".to_string(),
        action: InterceptAction::Block,
        priority: 0,
    }])
    .await
    .unwrap();

    page.goto(&server.url("/"), WaitUntil::Load, Duration::from_secs(10))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let transfer_size = page
        .evaluate(
            "performance.getEntriesByType('resource').find(e => e.name.endsWith('x.png'))?.transferSize ?? -1",
            false,
            true,
        )
        .await
        .unwrap();
    assert_eq!(transfer_size, serde_json::json!(0));
}

#[tokio::test]
#[ignore]
async fn s7_keyboard_shortcut_clears_contenteditable() {
    let server = TestServer::start(vec![(
        "/",
        "text/html",
        br#"<!doctype html><body><div id="e" contenteditable="true">hello</div></body>"#.to_vec(),
    )]);
    let browser = Browser::connect(&cdp_url()).await.unwrap();
    let page = browser.new_page("about:blank").await.unwrap();
    page.goto(&server.url("/"), WaitUntil::Load, Duration::from_secs(10))
        .await
        .unwrap();

    let el = page.find_element("#e").await.unwrap();
    el.focus().await.unwrap();
    page.shortcut(&["Control", "a"]).await.unwrap();
    page.press_key("Backspace").await.unwrap();

    let inner_text = page
        .evaluate("document.getElementById('e').innerText", false, true)
        .await
        .unwrap();
    assert_eq!(inner_text, serde_json::json!(""));
}
