use crate::error::NotesError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Brings the database server to a usable state.
#[async_trait]
pub trait SchemaProvisioner: Send + Sync {
    /// Wait for the server to accept connections. `false` once the retry
    /// budget is spent.
    async fn wait_until_available(&self) -> bool;

    /// Ensure the database and table exist, seeding the table when empty.
    /// Every step must be safe to re-run after a failure.
    async fn provision(&self) -> Result<(), NotesError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InitPhase {
    Uninitialized = 0,
    InProgress = 1,
    Ready = 2,
}

impl InitPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => InitPhase::InProgress,
            2 => InitPhase::Ready,
            _ => InitPhase::Uninitialized,
        }
    }
}

#[derive(Debug)]
struct InitState(AtomicU8);

impl InitState {
    fn new() -> Self {
        Self(AtomicU8::new(InitPhase::Uninitialized as u8))
    }

    fn get(&self) -> InitPhase {
        InitPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, phase: InitPhase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

/// Drops an interrupted run back to `Uninitialized`.
struct ResetOnUnwind(Arc<InitState>);

impl Drop for ResetOnUnwind {
    fn drop(&mut self) {
        if self.0.get() == InitPhase::InProgress {
            self.0.set(InitPhase::Uninitialized);
        }
    }
}

/// Runs provisioning at most once per instance.
///
/// A run executes on its own task and owns the lock until it finishes, so
/// dropping the caller does not interrupt it. Callers arriving while a run
/// is in flight wait on the mutex and then see `Ready`. A failed run drops
/// back to `Uninitialized` so a later call can retry from the first step.
pub struct SchemaInitializer {
    provisioner: Arc<dyn SchemaProvisioner>,
    state: Arc<InitState>,
    lock: Arc<Mutex<()>>,
}

impl SchemaInitializer {
    pub fn new(provisioner: Arc<dyn SchemaProvisioner>) -> Self {
        Self {
            provisioner,
            state: Arc::new(InitState::new()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn phase(&self) -> InitPhase {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == InitPhase::Ready
    }

    /// Provision the schema unless it is already ready.
    pub async fn initialize(&self) -> Result<(), NotesError> {
        if self.is_ready() {
            return Ok(());
        }

        let guard = self.lock.clone().lock_owned().await;
        if self.is_ready() {
            return Ok(());
        }

        let provisioner = self.provisioner.clone();
        let state = self.state.clone();
        let run = tokio::spawn(async move {
            let _guard = guard;
            let _reset = ResetOnUnwind(state.clone());

            state.set(InitPhase::InProgress);
            info!("initializing database schema");

            match provisioner.provision().await {
                Ok(()) => {
                    state.set(InitPhase::Ready);
                    info!("database schema initialized");
                    Ok(())
                }
                Err(e) => {
                    state.set(InitPhase::Uninitialized);
                    error!(error = %e, "database initialization failed");
                    Err(e)
                }
            }
        });

        match run.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(NotesError::InitFailed(Box::new(e))),
            Err(e) => {
                error!(error = %e, "database initialization task aborted");
                Err(NotesError::InitFailed(Box::new(e.into())))
            }
        }
    }

    /// Probe the server, then initialize. Failures are logged and reported
    /// as `false` so the caller can carry on degraded.
    pub async fn ensure_ready(&self) -> bool {
        if self.is_ready() {
            return true;
        }
        if !self.provisioner.wait_until_available().await {
            warn!("database unavailable; skipping initialization");
            return false;
        }
        self.initialize().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::task::JoinSet;

    #[derive(Default)]
    struct CountingProvisioner {
        runs: AtomicUsize,
        completed: AtomicUsize,
        failures_left: AtomicUsize,
        available: bool,
        delay: Duration,
    }

    impl CountingProvisioner {
        fn available() -> Self {
            Self {
                available: true,
                delay: Duration::from_millis(20),
                ..Default::default()
            }
        }

        fn failing_once() -> Self {
            Self {
                failures_left: AtomicUsize::new(1),
                ..Self::available()
            }
        }

        fn slow() -> Self {
            Self {
                delay: Duration::from_millis(300),
                ..Self::available()
            }
        }
    }

    #[async_trait]
    impl SchemaProvisioner for CountingProvisioner {
        async fn wait_until_available(&self) -> bool {
            self.available
        }

        async fn provision(&self) -> Result<(), NotesError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let failed = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(NotesError::ConnectTimeout(Duration::from_millis(1)));
            }
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn repeated_calls_provision_once() {
        let provisioner = Arc::new(CountingProvisioner::available());
        let init = SchemaInitializer::new(provisioner.clone());
        assert_eq!(init.phase(), InitPhase::Uninitialized);

        init.initialize().await.unwrap();
        init.initialize().await.unwrap();
        assert!(init.ensure_ready().await);

        assert_eq!(provisioner.runs.load(Ordering::SeqCst), 1);
        assert_eq!(init.phase(), InitPhase::Ready);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_share_one_run() {
        let provisioner = Arc::new(CountingProvisioner::available());
        let init = Arc::new(SchemaInitializer::new(provisioner.clone()));

        let mut set = JoinSet::new();
        for _ in 0..16 {
            let init = init.clone();
            set.spawn(async move { init.initialize().await.is_ok() });
        }
        while let Some(res) = set.join_next().await {
            assert!(res.unwrap());
        }

        assert_eq!(provisioner.runs.load(Ordering::SeqCst), 1);
        assert!(init.is_ready());
    }

    #[tokio::test]
    async fn failed_run_can_be_retried() {
        let provisioner = Arc::new(CountingProvisioner::failing_once());
        let init = SchemaInitializer::new(provisioner.clone());

        let err = init.initialize().await.unwrap_err();
        assert!(matches!(err, NotesError::InitFailed(_)));
        assert_eq!(init.phase(), InitPhase::Uninitialized);

        init.initialize().await.unwrap();
        assert!(init.is_ready());
        assert_eq!(provisioner.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unavailable_server_skips_provisioning() {
        let provisioner = Arc::new(CountingProvisioner::default());
        let init = SchemaInitializer::new(provisioner.clone());

        assert!(!init.ensure_ready().await);
        assert_eq!(provisioner.runs.load(Ordering::SeqCst), 0);
        assert_eq!(init.phase(), InitPhase::Uninitialized);
    }

    #[tokio::test]
    async fn dropped_caller_does_not_interrupt_the_run() {
        let provisioner = Arc::new(CountingProvisioner::slow());
        let init = SchemaInitializer::new(provisioner.clone());

        let abandoned = tokio::time::timeout(Duration::from_millis(30), init.initialize()).await;
        assert!(abandoned.is_err());
        assert_eq!(init.phase(), InitPhase::InProgress);

        // waits for the detached run instead of starting another
        init.initialize().await.unwrap();
        assert_eq!(init.phase(), InitPhase::Ready);
        assert_eq!(provisioner.runs.load(Ordering::SeqCst), 1);
        assert_eq!(provisioner.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropped_caller_run_finishes_on_its_own() {
        let provisioner = Arc::new(CountingProvisioner::slow());
        let init = SchemaInitializer::new(provisioner.clone());

        let _ = tokio::time::timeout(Duration::from_millis(30), init.initialize()).await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(init.phase(), InitPhase::Ready);
        assert_eq!(provisioner.completed.load(Ordering::SeqCst), 1);
    }
}
