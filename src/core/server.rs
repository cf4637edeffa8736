//! HTTP/1.1 server built on hyper.
//!
//! Each accepted connection is served on its own tokio task; the handler is
//! shared between them behind an `Arc`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::http::Request;
use crate::core::router::Handler;

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP server wrapping a single root handler
pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	/// Listen on `addr` until an accept error occurs
	pub async fn listen(self, addr: SocketAddr) -> Result<(), ServerError> {
		self.listen_with_shutdown(addr, std::future::pending()).await
	}

	/// Listen on `addr` until `shutdown` resolves, then stop accepting and
	/// wait for in-flight connections to finish
	pub async fn listen_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
	where
		F: Future<Output = ()>,
	{
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, shutdown).await
	}

	/// Serve connections from an already bound listener
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
	where
		F: Future<Output = ()>,
	{
		tracing::info!(addr = %listener.local_addr()?, "server listening");

		let graceful = GracefulShutdown::new();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = result?;
					let service = RequestService {
						handler: self.handler.clone(),
						remote_addr,
					};

					let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
					let connection = graceful.watch(connection);

					tokio::task::spawn(async move {
						if let Err(err) = connection.await {
							tracing::warn!(%remote_addr, error = %err, "error serving connection");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, stopping server");
					break;
				}
			}
		}

		graceful.shutdown().await;
		tracing::info!("server stopped");
		Ok(())
	}
}

/// Resolves when the process receives Ctrl-C
pub async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "failed to install Ctrl-C handler");
		std::future::pending::<()>().await;
	}
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = ServerError;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = body.collect().await?.to_bytes();

			let request = Request::new(parts.method, parts.uri, parts.version, parts.headers, body);

			let method = request.method.clone();
			let path = request.path().to_string();

			let response = match handler.handle(request).await {
				Ok(response) => response,
				Err(error) => error.into_response(),
			};

			tracing::debug!(%method, %path, status = response.status.as_u16(), %remote_addr, "request served");

			let mut hyper_response = hyper::Response::builder().status(response.status);
			for (key, value) in response.headers.iter() {
				hyper_response = hyper_response.header(key, value);
			}

			Ok(hyper_response.body(Full::new(response.body))?)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::http::Response;
	use crate::core::router::{Route, Router, view};
	use hyper::Method;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpStream;
	use tokio::sync::oneshot;

	#[tokio::test]
	async fn test_serves_request_over_tcp_and_shuts_down() {
		let hello = view((), |_request: Request, _state: ()| async {
			Ok(Response::ok().with_body("Hello, World!"))
		});
		let router = Router::new().route(Route::new("/", [Method::GET], hello).unwrap());

		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let (stop_tx, stop_rx) = oneshot::channel::<()>();

		let server = tokio::spawn(async move {
			HttpServer::new(Arc::new(router))
				.serve(listener, async {
					let _ = stop_rx.await;
				})
				.await
				.unwrap();
		});

		let mut stream = TcpStream::connect(addr).await.unwrap();
		stream
			.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
			.await
			.unwrap();
		let mut raw = String::new();
		stream.read_to_string(&mut raw).await.unwrap();

		assert!(raw.starts_with("HTTP/1.1 200 OK"));
		assert!(raw.ends_with("Hello, World!"));

		stop_tx.send(()).unwrap();
		server.await.unwrap();
	}
}
