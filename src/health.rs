use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::metrics;

type HttpResult = Result<Response<Full<Bytes>>, Infallible>;

// Uptime monitors hit "/"; the body text is part of the public surface.
const ALIVE_BODY: &str = "🤖 Bot Alive";

/// Liveness surface, deliberately independent of Router state: it answers
/// as long as the process is running.
async fn http_handler(req: Request<IncomingBody>) -> HttpResult {
    let response = match req.uri().path() {
        "/" => Response::new(Full::new(Bytes::from(ALIVE_BODY))),
        "/health" => Response::new(Full::new(Bytes::from("OK"))),
        "/metrics" => match metrics::gather_metrics() {
            Ok(metrics_data) => {
                let mut res = Response::new(Full::new(Bytes::from(metrics_data)));
                res.headers_mut()
                    .insert("Content-Type", "text/plain; version=0.0.4".parse().unwrap());
                res
            }
            Err(e) => {
                tracing::error!("Failed to gather metrics: {}", e);
                let mut res = Response::new(Full::new(Bytes::from("Internal Server Error")));
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                res
            }
        },
        _ => {
            let mut not_found = Response::new(Full::new(Bytes::from("Not Found")));
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            not_found
        }
    };
    Ok(response)
}

pub async fn run_http_server(port: u16) -> Result<()> {
    let http_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&http_addr).await?;
    tracing::info!("Liveness endpoint listening on http://{}", http_addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::task::spawn(async move {
            let service = service_fn(http_handler);

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!("Error serving HTTP connection: {:?}", err);
            }
        });
    }
}
