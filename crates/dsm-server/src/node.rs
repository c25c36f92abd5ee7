use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use dsm_link::{
    build_http_client, HttpParamClient, HttpPeerLink, LinkError, PeerLink, RetryPolicy,
};
use dsm_mutex::MutexCoordinator;
use dsm_replica::ReplicationManager;
use dsm_store::InMemoryObjectStore;
use dsm_types::{ClusterConfig, Peer, PeerId};

use crate::config::NodeOptions;
use crate::error::{ServerError, ServerResult};
use crate::listener::RequestListener;
use crate::server::RunningServer;
use crate::shutdown::Shutdown;

/// One running cluster member: its request listener plus the replication
/// and mutex layers wired to its peers and the parameter server.
pub struct DsmNode {
    config: ClusterConfig,
    options: NodeOptions,
    manager: ReplicationManager,
    mutex: MutexCoordinator,
    peers: Vec<Arc<HttpPeerLink>>,
    listener: RunningServer,
}

impl DsmNode {
    pub async fn start(config: ClusterConfig) -> ServerResult<Self> {
        Self::start_with(config, NodeOptions::default()).await
    }

    /// Start the listener, wait until it answers, then build the outbound
    /// links. Peers are not contacted.
    pub async fn start_with(config: ClusterConfig, options: NodeOptions) -> ServerResult<Self> {
        config.validate()?;

        let store = Arc::new(InMemoryObjectStore::new());
        let listener = RequestListener::bind(&config.bind_authority(), Arc::clone(&store)).await?;
        let http = build_http_client(options.request_timeout)?;

        let own_addr = reachable(listener.local_addr());
        let own_link = HttpPeerLink::new(
            Peer::new(own_addr.ip().to_string(), own_addr.port(), config.id),
            http.clone(),
        );
        await_health(&own_link, options.ready_timeout)
            .await
            .map_err(|e| match e {
                LinkError::Timeout { elapsed, .. } => ServerError::NotReady {
                    addr: own_addr,
                    elapsed,
                },
                other => other.into(),
            })?;

        let peers: Vec<Arc<HttpPeerLink>> = config
            .peers
            .iter()
            .map(|peer| Arc::new(HttpPeerLink::new(peer.clone(), http.clone())))
            .collect();
        let manager = ReplicationManager::new(
            store,
            peers
                .iter()
                .map(|link| Arc::clone(link) as Arc<dyn PeerLink>)
                .collect(),
        );

        let retry = RetryPolicy::from_settings(&config.retry);
        let params = HttpParamClient::new(&config.param_server, http, retry.clone());
        let mutex = MutexCoordinator::new(config.id, Arc::new(params), retry);

        tracing::info!(
            peer = %config.local_peer(),
            addr = %listener.local_addr(),
            cluster_size = config.cluster_size(),
            "node started"
        );
        Ok(Self {
            config,
            options,
            manager,
            mutex,
            peers,
            listener,
        })
    }

    pub fn id(&self) -> PeerId {
        self.config.id
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn manager(&self) -> &ReplicationManager {
        &self.manager
    }

    pub fn mutex(&self) -> &MutexCoordinator {
        &self.mutex
    }

    /// Wait until every peer's listener answers its health check.
    pub async fn wait_for_peers(&self) -> ServerResult<()> {
        for link in &self.peers {
            await_health(&**link, self.options.ready_timeout).await?;
            tracing::debug!(peer = %link.peer(), "peer ready");
        }
        Ok(())
    }

    /// Handle that stops the listener, as a `/stop` request would.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.listener.shutdown_handle()
    }

    /// Serve until a `/stop` request arrives.
    pub async fn wait(self) -> ServerResult<()> {
        self.listener.wait().await
    }

    pub async fn shutdown(self) -> ServerResult<()> {
        tracing::info!(id = self.config.id.get(), "node stopping");
        self.listener.stop().await
    }
}

/// A bind address made connectable: `0.0.0.0` becomes loopback.
fn reachable(mut addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        addr.set_ip(Ipv4Addr::LOCALHOST.into());
    }
    addr
}

async fn await_health(link: &dyn PeerLink, timeout: Duration) -> Result<(), LinkError> {
    RetryPolicy::new(Duration::from_millis(5), Duration::from_millis(200), Some(timeout))
        .run("health-check", move || link.health())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsm_store::ObjectStore;
    use dsm_types::{Endpoint, RetrySettings};

    use crate::param_server::ParamServer;

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn configs(n: u32, param_server: SocketAddr) -> Vec<ClusterConfig> {
        let members: Vec<Peer> = (0..n)
            .map(|id| Peer::new("127.0.0.1", free_port(), PeerId::new(id).unwrap()))
            .collect();
        members
            .iter()
            .map(|me| ClusterConfig {
                address: me.address.clone(),
                port: me.port,
                id: me.id,
                peers: members.iter().filter(|p| p.id != me.id).cloned().collect(),
                param_server: Endpoint::new("127.0.0.1", param_server.port()),
                retry: RetrySettings {
                    initial_backoff_ms: 1,
                    max_backoff_ms: 20,
                    timeout_ms: Some(30_000),
                },
            })
            .collect()
    }

    async fn start_cluster(n: u32) -> (RunningServer, Vec<DsmNode>) {
        let params = ParamServer::bind("127.0.0.1:0", Arc::new(dsm_store::ParamTable::new()))
            .await
            .unwrap();
        let mut nodes = Vec::new();
        for config in configs(n, params.local_addr()) {
            nodes.push(DsmNode::start(config).await.unwrap());
        }
        for node in &nodes {
            node.wait_for_peers().await.unwrap();
        }
        (params, nodes)
    }

    fn read_u32(node: &DsmNode, name: &str) -> u32 {
        let bytes = node.manager().read(name, 0, 4).unwrap();
        u32::from_le_bytes(bytes.try_into().unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn objects_replicate_over_http() {
        let (params, nodes) = start_cluster(3).await;

        let handle = nodes[0].manager().ensure("shared", 4).await.unwrap();
        handle.write(2, b"xyz").await.unwrap();

        for node in &nodes {
            let store = node.manager().local_store();
            assert_eq!(ObjectStore::read(store.as_ref(), "shared", 0, 5).unwrap(), b"\0\0xyz");
        }
        assert_eq!(nodes[0].manager().stats().failed, 0);

        nodes[1].manager().remove("shared").await.unwrap();
        for node in &nodes {
            assert!(!node.manager().local_store().contains("shared"));
        }

        for node in nodes {
            node.shutdown().await.unwrap();
        }
        params.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn multi_megabyte_write_reaches_peers() {
        let (params, nodes) = start_cluster(2).await;

        let data: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 253) as u8).collect();
        let handle = nodes[0].manager().ensure("big", 0).await.unwrap();
        handle.write(0, &data).await.unwrap();

        let stats = nodes[0].manager().stats();
        assert_eq!(stats.failed, 0, "{stats:?}");
        let remote = nodes[1].manager().local_store();
        assert_eq!(remote.size_of("big").unwrap(), data.len());
        assert_eq!(ObjectStore::read(remote.as_ref(), "big", 0, data.len()).unwrap(), data);

        for node in nodes {
            node.shutdown().await.unwrap();
        }
        params.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn locked_counter_across_nodes() {
        const ITERATIONS: u32 = 25;
        let (params, nodes) = start_cluster(3).await;

        for node in &nodes {
            node.manager().ensure("counter", 4).await.unwrap();
            node.mutex().create("counter-lock").await.unwrap();
        }

        let nodes: Vec<Arc<DsmNode>> = nodes.into_iter().map(Arc::new).collect();
        let tasks: Vec<_> = nodes
            .iter()
            .map(|node| {
                let node = Arc::clone(node);
                tokio::spawn(async move {
                    for _ in 0..ITERATIONS {
                        node.mutex().lock("counter-lock").await.unwrap();
                        let value = read_u32(&node, "counter");
                        node.manager()
                            .write("counter", 0, &(value + 1).to_le_bytes())
                            .await
                            .unwrap();
                        node.mutex().unlock("counter-lock").await.unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        for node in &nodes {
            assert_eq!(read_u32(node, "counter"), 3 * ITERATIONS);
        }
        params.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_request_ends_wait() {
        let params_addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let config = configs(1, params_addr).remove(0);
        let node = DsmNode::start(config).await.unwrap();
        let addr = node.local_addr();

        let link = HttpPeerLink::new(
            Peer::new("127.0.0.1", addr.port(), node.id()),
            build_http_client(Duration::from_secs(2)).unwrap(),
        );
        let serving = tokio::spawn(node.wait());
        link.stop().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), serving)
            .await
            .expect("listener stops")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let params_addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let mut config = configs(1, params_addr).remove(0);
        config.port = taken.local_addr().unwrap().port();
        assert!(matches!(DsmNode::start(config).await, Err(ServerError::Bind { .. })));
    }

    #[test]
    fn unspecified_bind_is_made_reachable() {
        let addr = reachable("0.0.0.0:7000".parse().unwrap());
        assert_eq!(addr, "127.0.0.1:7000".parse::<SocketAddr>().unwrap());
    }
}
