//! HTTP implementations of [`PeerLink`] and [`ParamClient`] over `reqwest`.
//!
//! Requests are POSTs with form-encoded bodies; see `dsm_protocol` for the
//! field layouts. Any non-2xx answer becomes [`LinkError::Remote`] carrying
//! the status and the response text.

use std::time::Duration;

use async_trait::async_trait;
use dsm_protocol::{
    decode_data, endpoints, parse_integer, CreateObjectForm, NameForm, ParamCasForm,
    ParamReadForm, ParamWriteForm, ProtocolError, ReadObjectForm, WriteObjectForm,
};
use dsm_types::{CasOutcome, Endpoint, ObjectInfo, Peer, PeerId};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LinkError, LinkResult};
use crate::param::ParamClient;
use crate::peer::PeerLink;
use crate::retry::RetryPolicy;

/// Build the shared HTTP client. `timeout` bounds each individual request.
pub fn build_http_client(timeout: Duration) -> LinkResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Turn a non-success answer into [`LinkError::Remote`].
async fn check(response: Response) -> LinkResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LinkError::Remote {
        status: status.as_u16(),
        message,
    })
}

async fn post_form<T: Serialize + Sync + ?Sized>(
    http: &Client,
    url: String,
    form: &T,
) -> LinkResult<Response> {
    let response = http.post(url).form(form).send().await?;
    check(response).await
}

fn decode_json<T: DeserializeOwned>(text: &str) -> LinkResult<T> {
    serde_json::from_str(text)
        .map_err(|e| LinkError::Protocol(ProtocolError::InvalidEncoding(e.to_string())))
}

// ---------------------------------------------------------------------------
// Peer link
// ---------------------------------------------------------------------------

/// Link to one peer's request listener.
#[derive(Clone, Debug)]
pub struct HttpPeerLink {
    peer: Peer,
    base_url: String,
    http: Client,
}

impl HttpPeerLink {
    pub fn new(peer: Peer, http: Client) -> Self {
        let base_url = peer.base_url();
        Self {
            peer,
            base_url,
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: Serialize + Sync + ?Sized>(&self, path: &str, form: &T) -> LinkResult<Response> {
        post_form(&self.http, self.url(path), form).await
    }
}

#[async_trait]
impl PeerLink for HttpPeerLink {
    fn peer(&self) -> &Peer {
        &self.peer
    }

    async fn create_object(&self, name: &str, size: usize) -> LinkResult<()> {
        let form = CreateObjectForm {
            name: name.to_string(),
            size,
        };
        self.post(endpoints::MEM_REGISTRATION, &form).await?;
        Ok(())
    }

    async fn delete_object(&self, name: &str) -> LinkResult<()> {
        self.post(endpoints::MEM_DELETION, &NameForm::new(name)).await?;
        Ok(())
    }

    async fn read_object(&self, name: &str, offset: usize, length: usize) -> LinkResult<Vec<u8>> {
        let form = ReadObjectForm {
            name: name.to_string(),
            offset,
            length,
        };
        let body = self.post(endpoints::MEM_READ, &form).await?.text().await?;
        Ok(decode_data(&body)?)
    }

    async fn write_object(&self, name: &str, offset: usize, data: &[u8]) -> LinkResult<()> {
        let form = WriteObjectForm::new(name, offset, data);
        self.post(endpoints::MEM_WRITE, &form).await?;
        Ok(())
    }

    async fn list_objects(&self) -> LinkResult<Vec<ObjectInfo>> {
        let response = self.http.get(self.url(endpoints::MEM_LIST)).send().await?;
        let body = check(response).await?.text().await?;
        decode_json(&body)
    }

    async fn health(&self) -> LinkResult<()> {
        let response = self.http.get(self.url(endpoints::HEALTH)).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn stop(&self) -> LinkResult<()> {
        let response = self.http.post(self.url(endpoints::STOP)).send().await?;
        check(response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parameter-server client
// ---------------------------------------------------------------------------

/// Parameter-server client. Every call is retried under its [`RetryPolicy`].
///
/// A compare-and-swap carries a random token that stays the same across
/// its retries; the server applies it at most once, so a retry after a
/// lost answer reports the swap instead of a mismatch against itself.
#[derive(Clone, Debug)]
pub struct HttpParamClient {
    base_url: String,
    http: Client,
    retry: RetryPolicy,
}

impl HttpParamClient {
    pub fn new(server: &Endpoint, http: Client, retry: RetryPolicy) -> Self {
        Self {
            base_url: server.base_url(),
            http,
            retry,
        }
    }

    async fn post_text<T: Serialize + Sync + ?Sized>(&self, path: &str, form: &T) -> LinkResult<String> {
        let url = format!("{}{}", self.base_url, path);
        Ok(post_form(&self.http, url, form).await?.text().await?)
    }
}

#[async_trait]
impl ParamClient for HttpParamClient {
    async fn register_param(&self, name: &str) -> LinkResult<()> {
        let form = &NameForm::new(name);
        self.retry
            .run("param-register", move || self.post_text(endpoints::PARAM_REGISTRATION, form))
            .await?;
        Ok(())
    }

    async fn deregister_param(&self, name: &str) -> LinkResult<()> {
        let form = &NameForm::new(name);
        self.retry
            .run("param-deregister", move || self.post_text(endpoints::PARAM_DELETION, form))
            .await?;
        Ok(())
    }

    async fn read_param(&self, id: PeerId, name: &str) -> LinkResult<i64> {
        let form = &ParamReadForm {
            id: id.get(),
            name: name.to_string(),
        };
        let body = self
            .retry
            .run("param-read", move || self.post_text(endpoints::PARAM_READ, form))
            .await?;
        Ok(parse_integer(&body)?)
    }

    async fn write_param(&self, id: PeerId, name: &str, value: i64) -> LinkResult<()> {
        let form = &ParamWriteForm {
            id: id.get(),
            name: name.to_string(),
            value,
        };
        self.retry
            .run("param-write", move || self.post_text(endpoints::PARAM_WRITE, form))
            .await?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        id: PeerId,
        name: &str,
        expected: i64,
        new: i64,
    ) -> LinkResult<CasOutcome> {
        let form = &ParamCasForm {
            id: id.get(),
            name: name.to_string(),
            expected,
            value: new,
            token: Some(rand::random()),
        };
        let body = self
            .retry
            .run("param-cas", move || self.post_text(endpoints::PARAM_CAS, form))
            .await?;
        decode_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_endpoint() -> Endpoint {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Endpoint::new("127.0.0.1", port)
    }

    #[test]
    fn peer_urls() {
        let peer = Peer::new("10.0.0.2", 9091, PeerId::new(2).unwrap());
        let link = HttpPeerLink::new(peer, Client::new());
        assert_eq!(link.url(endpoints::MEM_WRITE), "http://10.0.0.2:9091/mem/write");
        assert_eq!(link.peer().id.get(), 2);
    }

    #[tokio::test]
    async fn unreachable_peer_is_transport_error() {
        let server = unreachable_endpoint();
        let peer = Peer::new(server.address.clone(), server.port, PeerId::new(1).unwrap());
        let link = HttpPeerLink::new(peer, build_http_client(Duration::from_secs(2)).unwrap());
        let err = link.write_object("x", 0, b"abc").await.unwrap_err();
        assert!(matches!(err, LinkError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_param_server_times_out() {
        let policy = RetryPolicy::new(
            Duration::from_millis(2),
            Duration::from_millis(10),
            Some(Duration::from_millis(60)),
        );
        let client = HttpParamClient::new(
            &unreachable_endpoint(),
            build_http_client(Duration::from_secs(2)).unwrap(),
            policy,
        );
        let err = client
            .read_param(PeerId::new(0).unwrap(), "m")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Timeout { ref operation, .. } if operation == "param-read"));
    }
}
