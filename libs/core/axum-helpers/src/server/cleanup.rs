//! Connection cleanup during graceful shutdown.

use tracing::{error, info};

/// Close a SeaORM pool, logging the outcome.
///
/// Pools also close on drop; closing explicitly lets shutdown wait for it.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::close_postgres;
///
/// close_postgres(command_db, "command").await;
/// ```
pub async fn close_postgres(db: sea_orm::DatabaseConnection, name: &str) {
    match db.close().await {
        Ok(_) => info!(pool = name, "PostgreSQL pool closed"),
        Err(e) => error!(pool = name, error = %e, "Error closing PostgreSQL pool"),
    }
}

/// Runs named cleanup tasks concurrently and waits for all of them.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::{CleanupCoordinator, close_postgres};
///
/// let mut cleanup = CleanupCoordinator::new();
/// cleanup.add_task("command_db", close_postgres(command_db, "command"));
/// cleanup.add_task("query_db", close_postgres(query_db, "query"));
/// cleanup.run().await;
/// ```
pub struct CleanupCoordinator {
    tasks: Vec<(&'static str, tokio::task::JoinHandle<()>)>,
}

impl CleanupCoordinator {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// The task is spawned immediately.
    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.tasks.push((name, handle));
    }

    /// A panicking task is logged and does not stop the others.
    pub async fn run(self) {
        info!("Running {} cleanup tasks", self.tasks.len());

        for (name, handle) in self.tasks {
            match handle.await {
                Ok(_) => info!(task = name, "Cleanup task completed"),
                Err(e) => error!(task = name, error = %e, "Cleanup task failed"),
            }
        }

        info!("All cleanup tasks completed");
    }
}

impl Default for CleanupCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
