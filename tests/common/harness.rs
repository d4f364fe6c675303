//! Test server harness.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dalgurak::backend::{
    CorpusRetriever, Embedder, Generator, HashEmbedder, Passage, Retriever, TemplateGenerator,
};
use dalgurak::engine::{EngineConfig, QueryEngine};
use dalgurak::gateway::{HandlerState, create_router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;

pub fn recipe_corpus() -> Vec<Passage> {
    vec![
        Passage::new("김치찌개 레시피 재료 김치 돼지고기 두부"),
        Passage::new("김치찌개 조리 순서 김치를 볶기 후 물을 붓고 끓이기"),
        Passage::new("된장찌개 레시피 재료 된장 애호박 두부"),
        Passage::new("불고기 양념 재료와 굽기 요령"),
    ]
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub engine: Arc<QueryEngine>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
}

async fn wait_for_server_ready(addr: SocketAddr) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS);

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }
        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => tokio::time::sleep(Duration::from_millis(STARTUP_POLL_INTERVAL_MS)).await,
        }
    }
}

/// Spawns a server backed by the in-memory corpus, hashing embedder and template
/// generator. No external service is contacted.
pub async fn spawn_test_server(config: EngineConfig) -> Result<TestServer, ServerStartupError> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;

    let engine = Arc::new(QueryEngine::new(
        config,
        Arc::new(CorpusRetriever::new(recipe_corpus(), 3)) as Arc<dyn Retriever>,
        Arc::new(HashEmbedder::default()) as Arc<dyn Embedder>,
        Arc::new(TemplateGenerator::new()) as Arc<dyn Generator>,
    ));
    let app = create_router(HandlerState::new(Arc::clone(&engine), "template"));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    wait_for_server_ready(addr).await?;

    Ok(TestServer {
        addr,
        engine,
        _server_handle: handle,
        shutdown_tx: Some(shutdown_tx),
    })
}
