pub mod board;
pub mod config;
pub mod realtime;
pub mod rest;
pub mod storage;
pub mod ws;

use std::sync::Arc;

use board::BoardService;
use config::BoardConfig;
use realtime::ChannelRegistry;
use storage::BoardStore;

/// Shared application state passed to every request handler and server loop.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<BoardConfig>,
    pub store: Arc<BoardStore>,
    pub registry: Arc<ChannelRegistry>,
    pub board: Arc<BoardService>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Open storage under the configured data dir and wire the board
    /// components together.
    pub async fn init(config: BoardConfig) -> anyhow::Result<Arc<Self>> {
        let config = Arc::new(config);
        let store = Arc::new(BoardStore::open(&config.data_dir).await?);
        let registry = Arc::new(ChannelRegistry::new());
        let board = Arc::new(BoardService::new(store.clone(), registry.clone()));
        Ok(Arc::new(Self {
            config,
            store,
            registry,
            board,
            started_at: std::time::Instant::now(),
        }))
    }
}
