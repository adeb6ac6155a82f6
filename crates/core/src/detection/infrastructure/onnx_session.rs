use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Opens an ONNX model with the platform's preferred execution provider.
///
/// `intra_threads` bounds the threads one inference may use. Parallel
/// ingestion workers each own a session, so they pass a share of the
/// available cores instead of all of them.
pub fn open_session(
    model_path: &Path,
    intra_threads: usize,
) -> Result<Session, Box<dyn std::error::Error>> {
    log::debug!(
        "Opening ONNX session for {} with {intra_threads} intra threads",
        model_path.display()
    );
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads.max(1))?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Falls back to CPU when no accelerated provider is available.
fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Threads per session when `workers` sessions run side by side.
pub fn intra_threads_per_worker(workers: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / workers.max(1)).max(1)
}
