use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::backends::{BackendAdapter, BackendHandle};
use crate::models::{BackendKind, ModelDescriptor};
use crate::types::VideoGenError;

#[derive(Clone)]
enum HandleSlot {
    Ready(Arc<dyn BackendHandle>),
    /// Initialization failed. Kept until restart.
    Unavailable(String),
}

impl HandleSlot {
    fn into_result(self) -> Result<Arc<dyn BackendHandle>, VideoGenError> {
        match self {
            Self::Ready(handle) => Ok(handle),
            Self::Unavailable(reason) => Err(VideoGenError::ServiceUnavailable(reason)),
        }
    }
}

/// Registry of backend adapters plus a per-model cache of connected handles.
///
/// Each model is initialized once. The lock is never held across an await, so
/// two first requests for the same model may both initialize; the later
/// result wins and both callers get a usable handle.
pub struct AdapterRegistry {
    adapters: HashMap<BackendKind, Arc<dyn BackendAdapter>>,
    handles: RwLock<HashMap<String, HandleSlot>>,
}

impl AdapterRegistry {
    pub fn new(adapters: impl IntoIterator<Item = Arc<dyn BackendAdapter>>) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.kind(), adapter))
                .collect(),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// No adapters: every non-demo model reports unavailable.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the cached handle for `model`, initializing it on first use.
    pub async fn acquire(
        &self,
        model: &ModelDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, VideoGenError> {
        if let Some(slot) = self.cached(&model.id) {
            return slot.into_result();
        }

        let kind = model.backend.kind();
        let slot = match self.adapters.get(&kind) {
            None => {
                log::error!("No adapter registered for {kind}, model {}", model.id);
                HandleSlot::Unavailable(format!("no adapter registered for {kind}"))
            }
            Some(adapter) => {
                log::info!("Initializing {kind} backend for {}", model.id);
                match adapter.initialize(model).await {
                    Ok(handle) => {
                        log::info!("Backend for {} is ready", model.id);
                        HandleSlot::Ready(handle)
                    }
                    Err(e) => {
                        log::error!("Failed to initialize backend for {}: {e}", model.id);
                        HandleSlot::Unavailable(e.to_string())
                    }
                }
            }
        };

        self.handles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.id.clone(), slot.clone());
        slot.into_result()
    }

    /// True once a model has a connected handle.
    pub fn is_ready(&self, model_id: &str) -> bool {
        matches!(self.cached(model_id), Some(HandleSlot::Ready(_)))
    }

    pub fn ready_models(&self) -> Vec<String> {
        let mut ready: Vec<_> = self
            .handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, slot)| matches!(slot, HandleSlot::Ready(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ready.sort();
        ready
    }

    fn cached(&self, model_id: &str) -> Option<HandleSlot> {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::models::{BackendCall, COGVIDEOX_5B_MODEL, ZEROSCOPE_MODEL};

    struct EchoHandle;

    #[async_trait]
    impl BackendHandle for EchoHandle {
        async fn generate(&self, _call: BackendCall) -> Result<Value, VideoGenError> {
            Ok(Value::String("/tmp/out.mp4".into()))
        }
    }

    struct CountingAdapter {
        inits: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl CountingAdapter {
        fn new(fail: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                inits: AtomicUsize::new(0),
                fail,
                delay,
            })
        }
    }

    #[async_trait]
    impl BackendAdapter for CountingAdapter {
        fn kind(&self) -> BackendKind {
            BackendKind::HostedSpace
        }

        async fn initialize(
            &self,
            _model: &ModelDescriptor,
        ) -> Result<Arc<dyn BackendHandle>, VideoGenError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(VideoGenError::ServiceUnavailable("space is sleeping".into()))
            } else {
                Ok(Arc::new(EchoHandle))
            }
        }
    }

    #[tokio::test]
    async fn initializes_each_model_once() {
        let adapter = CountingAdapter::new(false, Duration::ZERO);
        let registry = AdapterRegistry::new([adapter.clone() as Arc<dyn BackendAdapter>]);

        assert!(!registry.is_ready("zeroscope"));
        registry.acquire(&ZEROSCOPE_MODEL).await.unwrap();
        registry.acquire(&ZEROSCOPE_MODEL).await.unwrap();
        assert_eq!(adapter.inits.load(Ordering::SeqCst), 1);
        assert!(registry.is_ready("zeroscope"));

        registry.acquire(&COGVIDEOX_5B_MODEL).await.unwrap();
        assert_eq!(adapter.inits.load(Ordering::SeqCst), 2);
        assert_eq!(registry.ready_models(), ["cogvideox-5b", "zeroscope"]);
    }

    #[tokio::test]
    async fn failed_initialization_is_cached() {
        let adapter = CountingAdapter::new(true, Duration::ZERO);
        let registry = AdapterRegistry::new([adapter.clone() as Arc<dyn BackendAdapter>]);

        for _ in 0..3 {
            let err = registry.acquire(&ZEROSCOPE_MODEL).await.err().unwrap();
            assert!(matches!(err, VideoGenError::ServiceUnavailable(_)));
        }
        assert_eq!(adapter.inits.load(Ordering::SeqCst), 1);
        assert!(!registry.is_ready("zeroscope"));
    }

    #[tokio::test]
    async fn missing_adapter_is_unavailable() {
        let registry = AdapterRegistry::empty();
        let err = registry.acquire(&ZEROSCOPE_MODEL).await.err().unwrap();
        assert!(matches!(err, VideoGenError::ServiceUnavailable(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_requests_all_get_a_handle() {
        let adapter = CountingAdapter::new(false, Duration::from_millis(50));
        let registry = Arc::new(AdapterRegistry::new([
            adapter.clone() as Arc<dyn BackendAdapter>
        ]));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.acquire(&ZEROSCOPE_MODEL).await.is_ok() })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        let inits = adapter.inits.load(Ordering::SeqCst);
        assert!((1..=8).contains(&inits));
        assert!(registry.is_ready("zeroscope"));

        // settled: no further initialization
        registry.acquire(&ZEROSCOPE_MODEL).await.unwrap();
        assert_eq!(adapter.inits.load(Ordering::SeqCst), inits);
    }
}
