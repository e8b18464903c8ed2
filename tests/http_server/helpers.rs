use std::{net::SocketAddr, sync::Arc, time::Duration};

use interop_monitor::{
    abi::EventDecoder,
    config::{AppConfig, DEFAULT_INBOX_ADDRESS, DEFAULT_MESSENGER_ADDRESS},
    engine::{
        correlation_service::{CorrelationService, StatsHandle},
        correlator::{CorrelatorSettings, MessageCorrelator},
    },
    http_server::{self, ApiState},
    models::Identifier,
    test_helpers::{StaticChainReader, executing_message_log, sent_message_log},
};
use reqwest::Client;
use tokio::{sync::mpsc, task};
use tokio_util::sync::CancellationToken;

pub const SENDER_CHAIN_ID: u64 = 901;

pub fn create_test_config(window: u64, purge_old_blocks: bool) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        aggregate_block_amount: window,
        purge_old_blocks,
        ..Default::default()
    })
}

pub struct TestServer {
    pub address: SocketAddr,
    pub handle: StatsHandle,
    pub client: Client,
    token: CancellationToken,
    server_handle: task::JoinHandle<()>,
    service_handle: task::JoinHandle<()>,
}

impl TestServer {
    /// Starts a correlation service fed with one matched message (sent at
    /// block 10, executed at block 12 thirty seconds later) and one unmatched
    /// send at block 11, then serves the API on an ephemeral port.
    pub async fn new(config: Arc<AppConfig>) -> Self {
        let sender = StaticChainReader::new(SENDER_CHAIN_ID)
            .with_timestamp(10, 1000)
            .with_timestamp(11, 1002);
        let receiver = StaticChainReader::new(902).with_timestamp(12, 1030);

        let settings = CorrelatorSettings::from_config(&config, SENDER_CHAIN_ID);
        let correlator = MessageCorrelator::new(
            settings,
            Arc::new(EventDecoder::with_default_abis().expect("Failed to load ABIs")),
            Arc::new(sender),
            Arc::new(receiver),
        );

        let token = CancellationToken::new();
        let (sent_tx, sent_rx) = mpsc::channel(16);
        let (executed_tx, executed_rx) = mpsc::channel(16);
        let (errors_tx, _errors_rx) = mpsc::channel(16);
        let (service, handle) =
            CorrelationService::new(correlator, sent_rx, executed_rx, errors_tx, 16, token.clone());
        let service_handle = task::spawn(service.run());

        sent_tx.send(sent_message_log(DEFAULT_MESSENGER_ADDRESS, 10, 0)).await.unwrap();
        sent_tx.send(sent_message_log(DEFAULT_MESSENGER_ADDRESS, 11, 0)).await.unwrap();
        let mut latest_rx = handle.subscribe_latest();
        latest_rx.wait_for(|latest| *latest >= 11).await.expect("service stopped");

        let id = Identifier {
            origin: DEFAULT_MESSENGER_ADDRESS,
            block_number: 10,
            log_index: 0,
            timestamp: 1000,
            chain_id: SENDER_CHAIN_ID,
        };
        executed_tx.send(executing_message_log(DEFAULT_INBOX_ADDRESS, 12, 0, &id)).await.unwrap();
        latest_rx.wait_for(|latest| *latest >= 12).await.expect("service stopped");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let address = listener.local_addr().expect("Failed to get address");
        let state = ApiState { handle: handle.clone(), config };
        let server_token = token.clone();
        let server_handle = task::spawn(async move {
            http_server::serve(listener, state, server_token).await.expect("Server failed");
        });

        Self { address, handle, client: Client::new(), token, server_handle, service_handle }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        let url = format!("http://{}{}", self.address, path);
        self.client.get(&url).send().await.expect("Request failed")
    }

    /// Stops the correlation service while leaving the server running.
    pub async fn stop_service(&mut self) {
        self.service_handle.abort();
        let _ = (&mut self.service_handle).await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.handle.is_closed() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("service should stop");
    }

    pub async fn shutdown(self) {
        self.token.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.server_handle)
            .await
            .expect("server should stop gracefully")
            .unwrap();
        self.service_handle.abort();
    }
}
