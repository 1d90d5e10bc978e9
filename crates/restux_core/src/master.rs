use std::sync::Arc;

use restux_cache::ResponseStore;
use restux_config::RestuxConfig;
use restux_user::UserDb;
use tokio::{net::TcpListener, sync::Semaphore};
use tracing::{info, instrument, warn};

use crate::worker::handle_connection;

/// Owns the listener and the long-lived shared services: the response cache
/// and the user database are built here once and handed to every worker.
pub struct Master {
    cfg: Arc<RestuxConfig>,
    cache: Arc<ResponseStore>,
    db: Arc<UserDb>,
}

impl Master {
    pub fn new(cfg: RestuxConfig) -> Self {
        let db = Arc::new(UserDb::new(cfg.db.path()));
        Self {
            cfg: Arc::new(cfg),
            cache: Arc::new(ResponseStore::new()),
            db,
        }
    }

    /// Starts the master process: binds the listener and spawns one worker
    /// task per accepted connection.
    #[instrument(skip(self), fields(
        listen = %self.cfg.http.listen,
        worker_connections = %self.cfg.global.worker_connections,
    ))]
    pub async fn run(self) -> anyhow::Result<()> {
        info!(target: "restux::master", "Starting RESTUX MASTER");

        // Global limit for concurrent connections across the entire process
        let max_conns = self.cfg.global.worker_connections as usize;
        let semaphore = Arc::new(Semaphore::new(max_conns));

        let listener = TcpListener::bind(self.cfg.http.listen()).await?;
        info!(
            target: "restux::master",
            listen = %self.cfg.http.listen,
            max_conns,
            "Listener ready"
        );

        loop {
            let permit = semaphore.clone().acquire_owned().await?;

            let (socket, client_addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(target: "restux::master", error = %e, "Accept failed");
                    continue;
                }
            };

            let cfg = Arc::clone(&self.cfg);
            let cache = Arc::clone(&self.cache);
            let db = Arc::clone(&self.db);

            tokio::spawn(async move {
                if let Err(e) =
                    handle_connection(Box::new(socket), client_addr, cfg, cache, db).await
                {
                    warn!(
                        target: "restux::worker",
                        error = %e,
                        "Connection ended with error"
                    );
                }
                drop(permit);
            });
        }
    }
}
