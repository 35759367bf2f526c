use moldview_io::{GeometrySource, LoadedGeometry};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct LoadCompletion {
    pub generation: u64,
    pub path: PathBuf,
    pub result: anyhow::Result<LoadedGeometry>,
}

pub struct GeometryLoader {
    source: Arc<dyn GeometrySource>,
    tx: mpsc::Sender<LoadCompletion>,
    rx: mpsc::Receiver<LoadCompletion>,
}

impl std::fmt::Debug for GeometryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryLoader").finish_non_exhaustive()
    }
}

impl GeometryLoader {
    pub fn new(source: Arc<dyn GeometrySource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { source, tx, rx }
    }

    pub fn request(&self, generation: u64, path: PathBuf) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name(format!("moldview-load-{generation}"))
            .spawn(move || {
                let result = source.load(&worker_path);
                let _ = tx.send(LoadCompletion {
                    generation,
                    path: worker_path,
                    result,
                });
            });
        if let Err(err) = spawned {
            warn!(%err, "load worker could not be spawned");
            let _ = self.tx.send(LoadCompletion {
                generation,
                path,
                result: Err(anyhow::Error::new(err).context("spawn load worker")),
            });
        } else {
            debug!(generation, "load worker spawned");
        }
    }

    pub fn try_recv(&self) -> Option<LoadCompletion> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<LoadCompletion> {
        self.rx.recv_timeout(timeout).ok()
    }
}
