use std::{error::Error as StdError, fmt};

use thiserror::Error;
use tracing::info;

use crate::manager::JobManager;

type BoxError = Box<dyn StdError + Send + Sync>;

pub type BotResult<T> = std::result::Result<T, BotError>;

/// Bot failure, classified where it happens.
#[derive(Error, Debug)]
pub enum BotError {
    /// The bot should be started again after a pause
    #[error("{0}")]
    Retriable(#[source] BoxError),

    /// The bot can not recover and the process should exit
    #[error("{0}")]
    Fatal(#[source] BoxError),
}

impl BotError {
    pub fn retriable(error: impl Into<BoxError>) -> Self {
        Self::Retriable(error.into())
    }

    pub fn fatal(error: impl Into<BoxError>) -> Self {
        Self::Fatal(error.into())
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Retriable(_))
    }
}

/// Chat front end driving a [`JobManager`]
#[allow(async_fn_in_trait)]
pub trait Bot<M: JobManager> {
    /// Serve until disconnected. Expected to run forever.
    async fn start(&self, manager: &M) -> BotResult<()>;
}

/// Bot that holds its token and parks until the process is asked to stop.
///
/// Chat transports plug in by implementing [`Bot`]; this one keeps the
/// manager alive for the web endpoints when no transport is compiled in.
pub struct StandbyBot {
    token: String,
}

impl StandbyBot {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for StandbyBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandbyBot").finish_non_exhaustive()
    }
}

impl<M: JobManager> Bot<M> for StandbyBot {
    async fn start(&self, _manager: &M) -> BotResult<()> {
        info!("bot on standby, waiting for shutdown signal");
        shutdown_signal().await.map_err(BotError::retriable)?;
        Err(BotError::fatal("shutdown signal received"))
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let retriable = BotError::retriable("socket closed");
        assert!(retriable.is_retriable());
        assert_eq!(retriable.to_string(), "socket closed");

        let fatal = BotError::fatal(std::io::Error::other("token revoked"));
        assert!(!fatal.is_retriable());
        assert_eq!(fatal.to_string(), "token revoked");
    }

    struct IdleManager;

    impl JobManager for IdleManager {
        async fn start(&self) -> crate::manager::ManagerResult<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_is_fatal() {
        use std::{process::Command, time::Duration};
        use tokio::signal::unix::{signal, SignalKind};

        // Keep the process alive once SIGTERM is delivered
        let _guard = signal(SignalKind::terminate()).unwrap();
        let bot = StandbyBot::new("token".to_string());

        let (stopped, killed) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(5), bot.start(&IdleManager)),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Command::new("sh")
                    .arg("-c")
                    .arg(format!("kill -TERM {}", std::process::id()))
                    .status()
            }
        );

        assert!(killed.unwrap().success());
        let err = stopped.unwrap().unwrap_err();
        assert!(!err.is_retriable());
        assert_eq!(err.to_string(), "shutdown signal received");
    }

    #[test]
    fn token_is_not_debug_printed() {
        let bot = StandbyBot::new("xoxb-secret".to_string());
        assert_eq!(bot.token(), "xoxb-secret");
        assert!(!format!("{bot:?}").contains("xoxb-secret"));
    }
}
