//! Async batch processing module
//!
//! Unpacks many dictionaries concurrently. Decoding is CPU-bound, so each
//! file runs on tokio's blocking pool while results stream back as they
//! complete.

#[cfg(feature = "async")]
/// Concurrent dictionary unpacking with a configurable concurrency limit
pub mod processor {
    use crate::unpack::{unpack_file, UnpackOptions, UnpackReport};
    use crate::{LsdError, Result};
    use futures::stream::{self, StreamExt};
    use log::{debug, warn};
    use std::path::{Path, PathBuf};

    /// Concurrent unpacker; one file's failure never cancels the others
    #[derive(Debug, Clone)]
    pub struct AsyncBatchProcessor {
        concurrency_limit: usize,
        options: UnpackOptions,
    }

    impl AsyncBatchProcessor {
        /// Create a processor using one worker per CPU and default options
        pub fn new() -> Self {
            Self {
                concurrency_limit: num_cpus::get(),
                options: UnpackOptions::default(),
            }
        }

        /// Set the concurrency limit
        pub fn with_concurrency(mut self, limit: usize) -> Self {
            self.concurrency_limit = limit.max(1);
            self
        }

        /// Set the unpack options applied to every file
        pub fn with_options(mut self, options: UnpackOptions) -> Self {
            self.options = options;
            self
        }

        /// Current concurrency limit
        pub fn concurrency(&self) -> usize {
            self.concurrency_limit
        }

        /// Unpack every file, returning one result per input in completion order
        pub async fn unpack_files<P: AsRef<Path> + 'static>(
            &self,
            files: Vec<P>,
        ) -> Vec<(PathBuf, Result<UnpackReport>)> {
            self.unpack_files_streaming(files).collect().await
        }

        /// Stream per-file results as they complete
        pub fn unpack_files_streaming<P: AsRef<Path> + 'static>(
            &self,
            files: Vec<P>,
        ) -> impl futures::Stream<Item = (PathBuf, Result<UnpackReport>)> + '_ {
            debug!(
                "Unpacking {} files, {} at a time",
                files.len(),
                self.concurrency_limit
            );

            stream::iter(files.into_iter().map(|path| {
                let path = path.as_ref().to_path_buf();
                let options = self.options.clone();
                async move {
                    let result = unpack_blocking(path.clone(), options).await;
                    if let Err(e) = &result {
                        warn!("{}: {e}", path.display());
                    }
                    (path, result)
                }
            }))
            .buffer_unordered(self.concurrency_limit)
        }
    }

    impl Default for AsyncBatchProcessor {
        fn default() -> Self {
            Self::new()
        }
    }

    async fn unpack_blocking(path: PathBuf, options: UnpackOptions) -> Result<UnpackReport> {
        tokio::task::spawn_blocking(move || unpack_file(&path, &options))
            .await
            .map_err(|e| LsdError::Io(std::io::Error::other(e)))?
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_builder() {
            let processor = AsyncBatchProcessor::new().with_concurrency(0);
            assert_eq!(processor.concurrency(), 1);
            assert!(AsyncBatchProcessor::default().concurrency() >= 1);
        }

        #[tokio::test]
        async fn test_missing_files_fail_independently() {
            let processor = AsyncBatchProcessor::new().with_concurrency(2);
            let results = processor
                .unpack_files(vec!["missing-a.lsd", "missing-b.lsd"])
                .await;

            assert_eq!(results.len(), 2);
            for (_, result) in results {
                assert!(matches!(result, Err(LsdError::Io(_))));
            }
        }
    }
}

#[cfg(feature = "async")]
pub use processor::AsyncBatchProcessor;
