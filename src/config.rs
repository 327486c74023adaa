use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Runtime;

/// Tuning for the HTTP client and the runtime requests are driven on.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: Option<String>,
    pub worker_threads: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: None,
            worker_threads: num_cpus::get(),
        }
    }
}

impl ClientConfig {
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Builds a `reqwest::Client` (rustls + compression) from this config.
    pub fn build_client(&self) -> reqwest::Result<Client> {
        let mut builder = Client::builder()
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder.build()
    }

    /// Builds a multi-threaded runtime with at least one worker.
    pub fn build_runtime(&self) -> std::io::Result<Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.worker_threads.max(1))
            .thread_name("promise-xhr")
            .enable_all()
            .build()
    }
}
