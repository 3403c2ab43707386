//! # Consumer Binding
//!
//! The delivery loop between an inbound channel and a [`Consumer`].
//!
//! Each message is handled in its own task, so a slow delivery never holds up the
//! others and no ordering is promised between them. Within one delivery:
//!
//! 1. The payload is decoded. A payload that does not decode is dead-lettered at once;
//!    the consumer never sees it.
//! 2. The consumer runs under [`DeliverySettings::timeout`]. A timeout counts as a
//!    retryable failure.
//! 3. Retryable failures are redelivered with exponential backoff until
//!    [`DeliverySettings::max_attempts`] is reached.
//! 4. Exhausted or non-retryable failures go to `<channel>.dlq` with the last error in
//!    `x-exception-message` and the attempt count in `x-delivery-attempts`.
//!
//! Redelivery lives here and only here. Consumers surface every failure and keep no
//! retry state of their own.

use crate::messaging::{Message, Publisher};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};

/// Header carrying the reason a message was dead-lettered.
pub const EXCEPTION_HEADER: &str = "x-exception-message";
/// Header carrying how many deliveries were attempted before dead-lettering.
pub const ATTEMPTS_HEADER: &str = "x-delivery-attempts";

/// Handles decoded payloads from a bound channel.
#[async_trait]
pub trait Consumer: Send + Sync + 'static {
    /// The payload type inbound messages decode into.
    type Payload: DeserializeOwned + Clone + Debug + Send + Sync + 'static;

    /// The failure type surfaced to the binding.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Process one delivery. Any `Err` leaves the message unacknowledged.
    async fn accept(&self, payload: Self::Payload) -> Result<(), Self::Error>;

    /// Whether a failure is worth redelivering. Defaults to always.
    fn is_retryable(_error: &Self::Error) -> bool {
        true
    }
}

/// Redelivery policy of a [`Binding`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeliverySettings {
    /// Deliveries per message, including the first. At least 1.
    pub max_attempts: u32,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    pub backoff_multiplier: f64,
    /// Upper bound for a single delivery attempt.
    pub timeout: Duration,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_initial: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            timeout: Duration::from_millis(5000),
        }
    }
}

impl DeliverySettings {
    /// Pause after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.backoff_initial.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.backoff_max.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Final fate of one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Acknowledged { attempts: u32 },
    DeadLettered { attempts: u32, reason: String },
}

/// Counts returned by [`Binding::run`] once the channel closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingReport {
    pub acknowledged: usize,
    pub dead_lettered: usize,
}

impl BindingReport {
    fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Acknowledged { .. } => self.acknowledged += 1,
            DeliveryOutcome::DeadLettered { .. } => self.dead_lettered += 1,
        }
    }
}

/// Binds a consumer to an inbound channel.
pub struct Binding<C: Consumer, P: Publisher> {
    channel: String,
    receiver: mpsc::UnboundedReceiver<Message>,
    consumer: Arc<C>,
    dead_letters: Arc<P>,
    settings: DeliverySettings,
}

impl<C: Consumer, P: Publisher> Binding<C, P> {
    /// `dead_letters` receives messages that could not be delivered.
    pub fn new(
        channel: impl Into<String>,
        receiver: mpsc::UnboundedReceiver<Message>,
        consumer: C,
        dead_letters: P,
        settings: DeliverySettings,
    ) -> Self {
        Self {
            channel: channel.into(),
            receiver,
            consumer: Arc::new(consumer),
            dead_letters: Arc::new(dead_letters),
            settings,
        }
    }

    pub fn dead_letter_channel(&self) -> String {
        format!("{}.dlq", self.channel)
    }

    /// Runs the delivery loop until the inbound channel closes, then waits for
    /// in-flight deliveries.
    pub async fn run(mut self) -> BindingReport {
        let channel = self.channel.clone();
        let dlq = Arc::new(self.dead_letter_channel());
        info!(%channel, "Binding started");

        let mut report = BindingReport::default();
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                message = self.receiver.recv() => {
                    let Some(message) = message else { break };
                    let span = tracing::info_span!("delivery", %channel);
                    in_flight.spawn(
                        deliver(
                            self.consumer.clone(),
                            self.dead_letters.clone(),
                            dlq.clone(),
                            self.settings.clone(),
                            message,
                        )
                        .instrument(span),
                    );
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    Self::collect(&mut report, joined);
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            Self::collect(&mut report, joined);
        }

        info!(
            %channel,
            acknowledged = report.acknowledged,
            dead_lettered = report.dead_lettered,
            "Binding stopped"
        );
        report
    }

    fn collect(report: &mut BindingReport, joined: Result<DeliveryOutcome, tokio::task::JoinError>) {
        match joined {
            Ok(outcome) => report.record(&outcome),
            Err(e) => error!(error = %e, "Delivery task failed"),
        }
    }
}

async fn deliver<C: Consumer, P: Publisher>(
    consumer: Arc<C>,
    dead_letters: Arc<P>,
    dlq: Arc<String>,
    settings: DeliverySettings,
    message: Message,
) -> DeliveryOutcome {
    let payload: C::Payload = match message.decode() {
        Ok(payload) => payload,
        Err(e) => {
            let reason = format!("undecodable payload: {e}");
            warn!(%reason, "Rejecting message");
            return dead_letter(dead_letters.as_ref(), &dlq, message, 0, reason).await;
        }
    };
    debug!(?payload, "Delivering");

    let max_attempts = settings.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let (reason, retryable) =
            match tokio::time::timeout(settings.timeout, consumer.accept(payload.clone())).await {
                Ok(Ok(())) => return DeliveryOutcome::Acknowledged { attempts: attempt },
                Ok(Err(e)) => (e.to_string(), C::is_retryable(&e)),
                Err(_) => (format!("delivery timed out after {:?}", settings.timeout), true),
            };

        if !retryable || attempt >= max_attempts {
            warn!(attempt, retryable, error = %reason, "Delivery failed for good");
            return dead_letter(dead_letters.as_ref(), &dlq, message, attempt, reason).await;
        }

        let pause = settings.backoff(attempt);
        warn!(attempt, error = %reason, ?pause, "Delivery failed, redelivering");
        tokio::time::sleep(pause).await;
        attempt += 1;
    }
}

async fn dead_letter<P: Publisher>(
    dead_letters: &P,
    dlq: &str,
    message: Message,
    attempts: u32,
    reason: String,
) -> DeliveryOutcome {
    let parked = message
        .with_header(EXCEPTION_HEADER, reason.clone())
        .with_header(ATTEMPTS_HEADER, attempts.to_string());
    if let Err(e) = dead_letters.publish(dlq, parked).await {
        error!(dlq, error = %e, "Dead-letter publish failed; message dropped");
    }
    DeliveryOutcome::DeadLettered { attempts, reason }
}
