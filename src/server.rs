//! The embedded label server.
//!
//! A deliberately minimal HTTP/1.1 server on raw `tokio::net` primitives:
//! one background task accepts connections, each connection gets its own
//! task, and every response closes the connection. This is not a
//! general-purpose server; it exists so a browser on the same machine can
//! pull the current record set and the bundled label-printing client.

use crate::error::EnricherError;
use async_trait::async_trait;
use bon::bon;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_PORT: u16 = 8000;

const REQUEST_BUFFER_SIZE: usize = 4096;

const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Photos</title></head>
<body>
    <h1>Photo Viewer</h1>
    <p>Loading...</p>
    <script>
        fetch('/specimens.json').then(r => r.json()).then(data => {
            document.body.innerHTML = '<h1>Photos Loaded</h1><pre>' + JSON.stringify(data, null, 2) + '</pre>';
        }).catch(e => {
            document.body.innerHTML = '<h1>Error</h1><p>' + e.message + '</p>';
        });
    </script>
</body>
</html>
"#;

/// Where `/specimens.json` gets its bytes.
///
/// An interface rather than a concrete coordinator, so the routing logic is
/// independent of how the snapshot is produced (and of the request parsing
/// strategy on the other side).
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// The current export snapshot as encoded JSON.
    async fn snapshot_json(&self) -> Vec<u8>;
}

/// The servable static files. Any entry may be absent; `/styles.css` and
/// `/script.js` then answer 404, while the HTML shell falls back to a
/// minimal inline page.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    pub index_html: Option<String>,
    pub styles_css: Option<String>,
    pub script_js: Option<String>,
}

impl AssetSet {
    /// The label-printing client compiled into the crate.
    pub fn bundled() -> Self {
        Self {
            index_html: Some(include_str!("../resources/index.html").to_string()),
            styles_css: Some(include_str!("../resources/styles.css").to_string()),
            script_js: Some(include_str!("../resources/script.js").to_string()),
        }
    }

    /// No static files at all; useful to exercise the fallback paths.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Handle to a running label server.
///
/// Dropping the handle also shuts the server down.
#[derive(Debug)]
pub struct LabelServer {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: Option<JoinHandle<()>>,
}

#[bon]
impl LabelServer {
    /// Binds the listening socket and starts the accept loop on a
    /// background task.
    ///
    /// A bind or listen failure is returned to the caller and is fatal to
    /// the server subsystem only; nothing else is affected. Port `0` binds
    /// an ephemeral port, queryable via [`LabelServer::local_addr`].
    #[builder]
    pub async fn serve(
        source: Arc<dyn SnapshotSource>,
        #[builder(default = DEFAULT_PORT)] port: u16,
        #[builder(default = AssetSet::bundled())] assets: AssetSet,
    ) -> Result<Self, EnricherError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "label server listening");

        let (shutdown, signal) = watch::channel(false);
        let accept_task = tokio::spawn(accept_loop(listener, source, assets, signal));

        Ok(Self {
            local_addr,
            shutdown,
            accept_task: Some(accept_task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Closes the listening socket and halts the accept loop. Idempotent;
    /// calling it again is a no-op. Connections accepted earlier finish
    /// their single response on their own tasks.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.accept_task.take() {
            let _ = task.await;
            tracing::info!(addr = %self.local_addr, "label server stopped");
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    source: Arc<dyn SnapshotSource>,
    assets: AssetSet,
    mut signal: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            // Either a stop() signal or the handle being dropped ends the
            // loop; the listener closes when it goes out of scope here.
            changed = signal.changed() => {
                if changed.is_err() || *signal.borrow() {
                    break;
                }
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(peer = %peer, "connection accepted");
                        let source = source.clone();
                        let assets = assets.clone();
                        tokio::spawn(handle_connection(stream, source, assets));
                    }
                    Err(err) => {
                        tracing::warn!(%err, "accept failed");
                    }
                }
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, source: Arc<dyn SnapshotSource>, assets: AssetSet) {
    let mut buffer = vec![0u8; REQUEST_BUFFER_SIZE];
    let read = match stream.read(&mut buffer).await {
        Ok(0) | Err(_) => return,
        Ok(read) => read,
    };

    // Malformed requests are dropped without a response.
    let Some(path) = request_path(&buffer[..read]) else {
        tracing::debug!("dropping malformed request");
        return;
    };
    tracing::debug!(path = %path, "request");

    let response = route(&path, source.as_ref(), &assets).await;
    if let Err(err) = write_response(&mut stream, &response).await {
        tracing::debug!(%err, "client went away mid-response");
    }
}

/// Extracts the request path from the first non-empty line. The method is
/// ignored; a request line with no path component targets `/`.
fn request_path(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    let first_line = text.lines().find(|line| !line.trim().is_empty())?;
    let mut parts = first_line.split_whitespace();
    parts.next()?;
    Some(parts.next().unwrap_or("/").to_string())
}

struct Response {
    status: u16,
    reason: &'static str,
    content_type: &'static str,
    cors: bool,
    body: String,
}

impl Response {
    fn ok(content_type: &'static str, body: String) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type,
            cors: true,
            body,
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            reason: "Not Found",
            content_type: "text/html",
            cors: false,
            body: "<html><body><h1>404 Not Found</h1></body></html>".to_string(),
        }
    }
}

async fn route(path: &str, source: &dyn SnapshotSource, assets: &AssetSet) -> Response {
    match path {
        "/specimens.json" => {
            let body = String::from_utf8(source.snapshot_json().await)
                .unwrap_or_else(|_| "[]".to_string());
            Response::ok("application/json", body)
        }
        "/styles.css" => match &assets.styles_css {
            Some(css) => Response::ok("text/css", css.clone()),
            None => Response::not_found(),
        },
        "/script.js" => match &assets.script_js {
            Some(js) => Response::ok("application/javascript", js.clone()),
            None => Response::not_found(),
        },
        _ => match &assets.index_html {
            Some(html) => Response::ok("text/html", html.clone()),
            None => Response::ok("text/html", FALLBACK_PAGE.to_string()),
        },
    }
}

async fn write_response(stream: &mut TcpStream, response: &Response) -> std::io::Result<()> {
    let cors = if response.cors {
        "Access-Control-Allow-Origin: *\r\n"
    } else {
        ""
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        response.status,
        response.reason,
        response.content_type,
        response.body.len(),
        cors,
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(response.body.as_bytes()).await?;
    stream.flush().await
}
