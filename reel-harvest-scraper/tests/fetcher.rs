use std::time::Instant;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Duration;

use reel_harvest_scraper::{FetchDiscipline, FetchError, Fetcher, FetcherConfig, HttpFetcher};

/// Minimal HTTP/1.1 server: `/ok` → 200, `/missing` → 404, anything else → 500.
async fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                loop {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = match path {
                    "/ok" => ("200 OK", "<html>hello</html>"),
                    "/missing" => ("404 Not Found", "nope"),
                    _ => ("500 Internal Server Error", "boom"),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

fn fetcher(base: &str, discipline: FetchDiscipline) -> HttpFetcher {
    HttpFetcher::new(FetcherConfig {
        base_url: base.to_string(),
        discipline,
        timeout: Duration::from_secs(5),
        user_agent: "reel-harvest-test".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn status_codes_map_to_body_or_absent() {
    let base = serve().await;
    let f = fetcher(&base, FetchDiscipline::Concurrent { max_in_flight: 2 });

    assert_eq!(
        f.fetch("/ok").await.unwrap().as_deref(),
        Some("<html>hello</html>")
    );
    assert_eq!(
        f.fetch(&format!("{base}/ok")).await.unwrap().as_deref(),
        Some("<html>hello</html>")
    );
    assert_eq!(f.fetch("/missing").await.unwrap(), None);
    assert_eq!(f.fetch("/boom").await.unwrap(), None);
}

#[tokio::test]
async fn empty_url_is_an_error() {
    let f = fetcher("http://127.0.0.1:9", FetchDiscipline::Concurrent { max_in_flight: 1 });
    assert!(matches!(
        f.fetch("  ").await,
        Err(FetchError::InvalidUrl { .. })
    ));
    assert!(matches!(
        f.fetch("ftp://example.com/x").await,
        Err(FetchError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn unreachable_host_is_absent_not_error() {
    // Port 9 (discard) is essentially never listening on loopback.
    let f = fetcher("http://127.0.0.1:9", FetchDiscipline::Concurrent { max_in_flight: 1 });
    assert_eq!(f.fetch("/ok").await.unwrap(), None);
}

#[tokio::test]
async fn serial_mode_spaces_requests() {
    let base = serve().await;
    let gap = Duration::from_millis(150);
    let f = fetcher(&base, FetchDiscipline::Serial { min_interval: gap });

    let started = Instant::now();
    for _ in 0..3 {
        assert!(f.fetch("/ok").await.unwrap().is_some());
    }
    // The first request goes out immediately; the next two each wait.
    assert!(started.elapsed() >= gap * 2);
}
