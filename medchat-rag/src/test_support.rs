//! Throwaway HTTP servers standing in for the hosted providers.

use axum::Router;

/// Serve `app` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_provider(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("provider stub run");
    });

    (format!("http://{addr}"), handle)
}
