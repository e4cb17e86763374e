//! Malware scanning
//!
//! The scanner connection is established once at startup. If the daemon
//! cannot be reached after the configured retries, scanning is disabled and
//! every upload is reported clean with an explanatory detail. Once connected,
//! any error during an individual scan rejects the upload.

use async_trait::async_trait;
use thispdf_core::ScanVerdict;

pub const SCAN_SKIPPED: &str = "ClamAV not available - scan skipped";
pub const SCAN_CLEAN: &str = "File is clean";

#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, data: &[u8]) -> ScanVerdict;

    /// Whether a daemon connection was established at startup.
    fn is_available(&self) -> bool;
}

/// Scanner used when no daemon is configured or reachable.
#[derive(Debug, Clone, Default)]
pub struct DisabledScanner;

#[async_trait]
impl VirusScanner for DisabledScanner {
    async fn scan(&self, data: &[u8]) -> ScanVerdict {
        tracing::warn!(size_bytes = data.len(), "{}", SCAN_SKIPPED);
        ScanVerdict::clean(SCAN_SKIPPED)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Describe a non-clean daemon reply.
///
/// `stream: Eicar-Test-Signature FOUND` yields the signature name. Any other
/// reply (e.g. `INSTREAM size limit exceeded. ERROR`) is kept as the daemon
/// sent it, minus the `stream:` prefix and trailing status word.
pub fn reply_detail(response: &str) -> String {
    let response = response.trim_end_matches('\0').trim();
    let body = response
        .strip_prefix("stream:")
        .unwrap_or(response)
        .trim();

    if let Some(signature) = body.strip_suffix("FOUND") {
        return match signature.split_whitespace().next() {
            Some(name) => name.to_string(),
            None => "unknown".to_string(),
        };
    }

    let body = body.strip_suffix("ERROR").unwrap_or(body).trim();
    if body.is_empty() {
        "unknown".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(feature = "clamav")]
pub use clamav::ClamAVScanner;

#[cfg(feature = "clamav")]
mod clamav {
    use super::{reply_detail, DisabledScanner, VirusScanner, SCAN_CLEAN};
    use async_trait::async_trait;
    use clamav_client::{clean, Tcp};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use thispdf_core::{ScanVerdict, ScannerConfig};

    /// [`VirusScanner`] backed by a clamd daemon over TCP.
    #[derive(Clone)]
    pub struct ClamAVScanner {
        address: String,
        timeout: Duration,
    }

    impl ClamAVScanner {
        /// Ping the daemon with bounded retries. Returns `None` when it never
        /// answered; the caller decides what to run without it.
        pub async fn connect(config: &ScannerConfig) -> Option<Self> {
            let address = config.address();
            let attempts = config.retries.max(1);
            let delay = Duration::from_secs(config.retry_delay_secs);

            for attempt in 1..=attempts {
                match ping(&address).await {
                    Ok(()) => {
                        tracing::info!(address = %address, attempt, "Connected to ClamAV");
                        return Some(Self {
                            address,
                            timeout: Duration::from_secs(config.timeout_secs),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(
                            address = %address,
                            attempt,
                            max_attempts = attempts,
                            error = %e,
                            "ClamAV connection attempt failed"
                        );
                        if attempt < attempts {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }

            tracing::warn!(
                address = %address,
                "ClamAV unreachable after retries, continuing without virus scanning"
            );
            None
        }

        /// Connect, or fall back to a [`DisabledScanner`].
        pub async fn connect_or_disabled(config: &ScannerConfig) -> Arc<dyn VirusScanner> {
            match Self::connect(config).await {
                Some(scanner) => Arc::new(scanner),
                None => Arc::new(DisabledScanner),
            }
        }
    }

    async fn ping(address: &str) -> Result<(), String> {
        let address = address.to_string();
        let reply = tokio::task::spawn_blocking(move || {
            clamav_client::ping(Tcp {
                host_address: address.as_str(),
            })
        })
        .await
        .map_err(|e| format!("ping task failed: {}", e))?
        .map_err(|e| e.to_string())?;

        if reply.starts_with(b"PONG") {
            Ok(())
        } else {
            Err(format!(
                "unexpected ping reply: {}",
                String::from_utf8_lossy(&reply).trim()
            ))
        }
    }

    #[async_trait]
    impl VirusScanner for ClamAVScanner {
        /// Scan in-memory data using the sync API inside spawn_blocking.
        async fn scan(&self, data: &[u8]) -> ScanVerdict {
            let start = Instant::now();
            tracing::debug!(address = %self.address, size_bytes = data.len(), "Starting ClamAV scan");
            let data = data.to_vec();
            let address = self.address.clone();

            let result = tokio::time::timeout(
                self.timeout,
                tokio::task::spawn_blocking(move || {
                    let connection = Tcp {
                        host_address: address.as_str(),
                    };
                    match clamav_client::scan_buffer(data.as_slice(), connection, None) {
                        Ok(response_bytes) => match clean(&response_bytes) {
                            Ok(true) => ScanVerdict::clean(SCAN_CLEAN),
                            Ok(false) => {
                                let response = String::from_utf8_lossy(&response_bytes);
                                ScanVerdict::rejected(format!(
                                    "Virus detected: {}",
                                    reply_detail(&response)
                                ))
                            }
                            Err(e) => ScanVerdict::rejected(format!(
                                "Scan error: invalid ClamAV response: {}",
                                e
                            )),
                        },
                        Err(e) => ScanVerdict::rejected(format!("Scan error: {}", e)),
                    }
                }),
            )
            .await;

            let verdict = match result {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) => ScanVerdict::rejected(format!("Scan error: scan task failed: {}", e)),
                Err(_) => ScanVerdict::rejected(format!(
                    "Scan error: timed out after {} seconds",
                    self.timeout.as_secs()
                )),
            };

            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
            if verdict.clean {
                tracing::info!(duration_ms, "File scan completed: clean");
            } else {
                tracing::warn!(duration_ms, detail = %verdict.detail, "File scan rejected upload");
            }
            verdict
        }

        fn is_available(&self) -> bool {
            true
        }
    }

}
