use crate::errors::{Error, Result};
use std::time::Duration;
use tracing::error;

/// Runs a blocking job, failing with `Error::Timeout` if it exceeds `timeout`
///
/// The job runs on a Tokio blocking thread. A job that times out cannot be
/// cancelled; it is abandoned and the runtime shuts down without waiting for it.
pub fn run_with_timeout<F>(task: &str, timeout: Duration, job: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;

    let outcome = runtime.block_on(async {
        tokio::time::timeout(timeout, tokio::task::spawn_blocking(job)).await
    });
    runtime.shutdown_background();

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => match join_error.try_into_panic() {
            Ok(panic) => std::panic::resume_unwind(panic),
            Err(join_error) => Err(Error::Io(std::io::Error::other(join_error.to_string()))),
        },
        Err(_) => {
            error!("Task {} exceeded {}", task, humantime::format_duration(timeout));
            Err(Error::Timeout {
                task: task.to_string(),
                timeout: humantime::format_duration(timeout).to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_within_timeout() {
        let result = run_with_timeout("LogProgress", Duration::from_secs(5), || Ok(()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_job_error_propagates() {
        let result = run_with_timeout("Qc2obsmon", Duration::from_secs(5), || {
            Err(Error::UnsupportedObservationType("WG2".to_string()))
        });
        assert!(matches!(result, Err(Error::UnsupportedObservationType(_))));
    }

    #[test]
    fn test_hung_job_times_out() {
        let result = run_with_timeout("OptimalInterpolation", Duration::from_millis(50), || {
            std::thread::sleep(Duration::from_secs(2));
            Ok(())
        });
        match result {
            Err(Error::Timeout { task, timeout }) => {
                assert_eq!(task, "OptimalInterpolation");
                assert_eq!(timeout, "50ms");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
