//! Explicit execution context shared by all pipeline stages
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use simple_error::{SimpleResult, map_err_with};

/// Process-wide runtime state for one pipeline invocation
///
/// This is created once before any pipeline stage runs and handed to each stage that needs the
/// worker pool or run-level settings. Resources are released when the context is dropped.
///
pub struct ExecutionContext {
    worker_pool: rayon::ThreadPool,
    thread_count: usize,
    local_tmp_dir: Option<Utf8PathBuf>,
    billing_project: Option<String>,
}

impl ExecutionContext {
    /// # Arguments
    /// * `local_tmp_dir` - Local scratch directory, this is expected to exist already
    /// * `billing_project` - Billing/project identifier attached to this run
    ///
    pub fn init(
        thread_count: usize,
        local_tmp_dir: Option<&Utf8Path>,
        billing_project: Option<&str>,
    ) -> SimpleResult<Self> {
        assert!(thread_count > 0);

        let worker_pool = map_err_with!(
            rayon::ThreadPoolBuilder::new()
                .num_threads(thread_count)
                .build(),
            "Failed to create worker thread pool"
        )?;

        if let Some(billing_project) = billing_project {
            info!("Billing project: {billing_project}");
        }
        if let Some(local_tmp_dir) = local_tmp_dir {
            debug!("Local temporary directory: '{local_tmp_dir}'");
        }

        Ok(Self {
            worker_pool,
            thread_count,
            local_tmp_dir: local_tmp_dir.map(|x| x.to_owned()),
            billing_project: billing_project.map(|x| x.to_string()),
        })
    }

    pub fn worker_pool(&self) -> &rayon::ThreadPool {
        &self.worker_pool
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn billing_project(&self) -> Option<&str> {
        self.billing_project.as_deref()
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        match &self.local_tmp_dir {
            Some(x) => debug!("Shutting down execution context, scratch files remain in '{x}'"),
            None => debug!("Shutting down execution context"),
        }
    }
}
