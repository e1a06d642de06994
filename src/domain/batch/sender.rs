use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::config::{GatewayConfig, EXPO_MAX_BATCH_SIZE};
use crate::gateway::{GatewayError, PushGateway, PushMessage, PushTicket};
use crate::metrics::GatewayMetrics;
use crate::notification::{DeliveryError, DispatchMessage, DispatchResult};

/// Batch sender configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum tokens per gateway call
    pub batch_size: usize,
    /// Chunks allowed in flight at once (1 = sequential)
    pub max_concurrent: usize,
    /// Upper bound for one gateway call
    pub call_timeout: Duration,
    /// Android notification channel
    pub channel_id: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: EXPO_MAX_BATCH_SIZE,
            max_concurrent: 1,
            call_timeout: Duration::from_secs(10),
            channel_id: "default".to_string(),
        }
    }
}

impl From<&GatewayConfig> for BatchConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            max_concurrent: config.max_concurrent_batches.max(1),
            call_timeout: Duration::from_secs(config.timeout_seconds),
            channel_id: config.channel_id.clone(),
        }
    }
}

/// Accounting for one chunk. Chunks never share counters; the dispatch
/// total is a reduction over these.
#[derive(Debug, Default)]
struct ChunkOutcome {
    sent: usize,
    failed: usize,
    errors: Vec<DeliveryError>,
}

impl ChunkOutcome {
    fn from_tickets(tokens: &[String], tickets: Vec<PushTicket>) -> Self {
        let mut outcome = Self::default();
        for (token, ticket) in tokens.iter().zip(tickets) {
            if ticket.is_ok() {
                outcome.sent += 1;
            } else {
                outcome.failed += 1;
                outcome
                    .errors
                    .push(DeliveryError::rejected(token.clone(), ticket.message, ticket.details));
            }
        }
        outcome
    }

    fn transport_failure(chunk_len: usize, error: &GatewayError) -> Self {
        Self {
            sent: 0,
            failed: chunk_len,
            errors: vec![DeliveryError::transport(error.to_string(), chunk_len)],
        }
    }
}

/// Fans one message out to a token list in gateway-sized chunks.
pub struct BatchSender {
    gateway: Arc<dyn PushGateway>,
    config: BatchConfig,
}

impl BatchSender {
    pub fn new(gateway: Arc<dyn PushGateway>, config: BatchConfig) -> Self {
        Self {
            gateway,
            config: BatchConfig {
                batch_size: config.batch_size.max(1),
                max_concurrent: config.max_concurrent.max(1),
                ..config
            },
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn gateway_name(&self) -> &'static str {
        self.gateway.name()
    }

    /// Send `message` to every token and return the aggregate result.
    ///
    /// Never fails: a chunk whose call errors, times out or returns an
    /// unusable response counts all of its tokens as failed, and the
    /// remaining chunks are still sent.
    #[tracing::instrument(
        name = "batch.send",
        skip(self, tokens, message),
        fields(token_count = tokens.len(), gateway = self.gateway.name())
    )]
    pub async fn send_batches(&self, tokens: &[String], message: &DispatchMessage) -> DispatchResult {
        if tokens.is_empty() {
            return DispatchResult::empty();
        }

        let chunks: Vec<&[String]> = tokens.chunks(self.config.batch_size).collect();
        let chunk_count = chunks.len();

        let outcomes: Vec<ChunkOutcome> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| self.send_chunk(index, chunk, message))
            .buffered(self.config.max_concurrent)
            .collect()
            .await;

        let (sent, failed, errors) = outcomes.into_iter().fold(
            (0usize, 0usize, Vec::new()),
            |(sent, failed, mut errors), outcome| {
                errors.extend(outcome.errors);
                (sent + outcome.sent, failed + outcome.failed, errors)
            },
        );

        tracing::info!(
            chunks = chunk_count,
            sent = sent,
            failed = failed,
            "Batch send complete"
        );

        DispatchResult::from_tally(sent, failed, errors)
    }

    async fn send_chunk(&self, index: usize, chunk: &[String], message: &DispatchMessage) -> ChunkOutcome {
        let messages: Vec<PushMessage> = chunk
            .iter()
            .map(|token| PushMessage::for_token(token.as_str(), message, &self.config.channel_id))
            .collect();

        let started = Instant::now();
        let result = match tokio::time::timeout(self.config.call_timeout, self.gateway.send_batch(&messages)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.config.call_timeout)),
        };
        GatewayMetrics::record_latency(started.elapsed().as_secs_f64());

        // Tickets are positional; a count mismatch makes every pairing suspect
        let result = result.and_then(|tickets| {
            if tickets.len() == chunk.len() {
                Ok(tickets)
            } else {
                Err(GatewayError::TicketCountMismatch {
                    expected: chunk.len(),
                    actual: tickets.len(),
                })
            }
        });

        let outcome = match result {
            Ok(tickets) => ChunkOutcome::from_tickets(chunk, tickets),
            Err(e) => {
                tracing::warn!(
                    batch_index = index,
                    batch_size = chunk.len(),
                    error = %e,
                    "Gateway call failed, counting batch as failed"
                );
                GatewayMetrics::record_transport_failure();
                ChunkOutcome::transport_failure(chunk.len(), &e)
            }
        };

        GatewayMetrics::record_tickets(outcome.sent, outcome.failed);
        tracing::debug!(
            batch_index = index,
            sent = outcome.sent,
            failed = outcome.failed,
            "Batch processed"
        );

        outcome
    }
}
