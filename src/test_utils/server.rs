//! A throwaway HTTP/1.1 server on localhost for exercising the fetch layer
//! without touching the network.

use crate::config::ScraperConfig;
use crate::fetcher::Fetcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: String },
    Stall,
}

/// One canned response, matched on the exact request path.
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    reply: Reply,
}

impl Route {
    pub fn ok(path: &str, body: &str) -> Self {
        Route {
            path: path.to_string(),
            reply: Reply::Respond {
                status: 200,
                body: body.to_string(),
            },
        }
    }

    pub fn status(path: &str, status: u16) -> Self {
        Route {
            path: path.to_string(),
            reply: Reply::Respond {
                status,
                body: String::new(),
            },
        }
    }

    /// Accepts the request and never answers.
    pub fn stall(path: &str) -> Self {
        Route {
            path: path.to_string(),
            reply: Reply::Stall,
        }
    }
}

/// Starts a server for `routes` and returns its base URL, e.g.
/// `http://127.0.0.1:38211`. Unknown paths get a 404.
pub async fn serve(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Test server has no address");
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            tokio::spawn(handle(socket, routes));
        }
    });

    format!("http://{addr}")
}

async fn handle(mut socket: TcpStream, routes: Arc<Vec<Route>>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/");
    let reply = routes
        .iter()
        .find(|route| route.path == path)
        .map(|route| route.reply.clone())
        .unwrap_or(Reply::Respond {
            status: 404,
            body: String::new(),
        });

    match reply {
        Reply::Stall => tokio::time::sleep(Duration::from_secs(3600)).await,
        Reply::Respond { status, body } => {
            let response = format!(
                "HTTP/1.1 {status} {}\r\n\
                 Content-Type: text/html; charset=utf-8\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                reason(status),
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// A config that accepts the local test server as an article host.
pub fn test_config(timeout_secs: u64) -> ScraperConfig {
    ScraperConfig {
        timeout_secs,
        concurrency: 4,
        allowed_domains: vec!["127.0.0.1".to_string()],
        ..ScraperConfig::default()
    }
}

/// A fetcher for `config` that bypasses any proxy configured in the
/// environment.
pub fn test_fetcher_with(config: ScraperConfig) -> Fetcher {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .no_proxy()
        .build()
        .expect("Failed to build test client");
    Fetcher::with_client(client, config)
}

pub fn test_fetcher(timeout_secs: u64) -> Fetcher {
    test_fetcher_with(test_config(timeout_secs))
}
