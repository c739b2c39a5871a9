//! Opens the outbound WebSocket connection to the upstream realtime API.

use anyhow::{Context, Result};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::client::IntoClientRequest,
};

pub type UpstreamStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the upstream API, authenticating with a bearer token.
///
/// The credential never reaches the downstream client; injecting it here is
/// the reason the relay exists.
pub async fn connect(url: &str, api_key: &str) -> Result<UpstreamStream> {
    let mut request = url
        .into_client_request()
        .context("Invalid upstream URL")?;
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {}", api_key)
            .parse()
            .context("API key is not a valid header value")?,
    );

    let (stream, _) = connect_async(request)
        .await
        .context("Failed to connect to upstream realtime API")?;
    Ok(stream)
}
