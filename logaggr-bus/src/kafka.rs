//! Kafka-backed [`Bus`](crate::core::Bus) implementation.
//!
//! Built on `rdkafka`, a maintained, crates.io-published client with a
//! "one producer, one consumer-group-scoped reader" shape that fits
//! the [`core`](crate::core) trait split directly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;

use crate::core::{BusAdmin, BusError, BusReading, BusRecord, BusWriting, ClusterHealth};

/// A real Kafka-backed bus. One [`KafkaBus`] can back `BusWriting` for
/// the producer and, after [`Self::consumer_for`] has built a
/// topic/group-scoped [`StreamConsumer`], `BusReading` too.
pub struct KafkaBus {
    producer: FutureProducer,
    bootstrap_servers: String,
    consumers: Mutex<HashMap<(String, String), Arc<StreamConsumer>>>,
}

impl std::fmt::Debug for KafkaBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaBus")
            .field("bootstrap_servers", &self.bootstrap_servers)
            .finish()
    }
}

impl KafkaBus {
    pub fn new(bootstrap_servers: impl Into<String>) -> Result<Self, BusError> {
        let bootstrap_servers = bootstrap_servers.into();
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &bootstrap_servers)
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|err| BusError::Transport(Box::new(err)))?;
        Ok(Self {
            producer,
            bootstrap_servers,
            consumers: Mutex::new(HashMap::new()),
        })
    }

    fn consumer_for(&self, topic: &str, group: &str) -> Result<Arc<StreamConsumer>, BusError> {
        let key = (topic.to_string(), group.to_string());
        let mut consumers = self.consumers.lock().unwrap();
        if let Some(consumer) = consumers.get(&key) {
            return Ok(consumer.clone());
        }
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("group.id", group)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|err| BusError::Transport(Box::new(err)))?;
        consumer
            .subscribe(&[topic])
            .map_err(|err| BusError::Transport(Box::new(err)))?;
        let consumer = Arc::new(consumer);
        consumers.insert(key, consumer.clone());
        Ok(consumer)
    }
}

#[async_trait]
impl BusWriting for KafkaBus {
    async fn send(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let record = FutureRecord::to(topic).key(key).payload(&payload);
        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| BusError::Transport(Box::new(err)))?;
        Ok(())
    }
}

#[async_trait]
impl BusReading for KafkaBus {
    async fn poll_batch(
        &self,
        topic: &str,
        group: &str,
        max_records: usize,
        linger: Duration,
    ) -> Result<Vec<BusRecord>, BusError> {
        let consumer = self.consumer_for(topic, group)?;

        let mut batch = Vec::with_capacity(max_records);
        let deadline = tokio::time::Instant::now() + linger;
        let mut stream = consumer.stream();
        loop {
            if batch.len() >= max_records {
                break;
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, stream.next()).await {
                Ok(Some(Ok(message))) => {
                    batch.push(BusRecord {
                        key: message
                            .key()
                            .map(|k| String::from_utf8_lossy(k).to_string())
                            .unwrap_or_default(),
                        payload: message.payload().unwrap_or_default().to_vec(),
                        partition: message.partition(),
                        offset: message.offset(),
                    });
                }
                Ok(Some(Err(err))) => return Err(BusError::Transport(Box::new(err))),
                Ok(None) | Err(_) => break,
            }
        }
        Ok(batch)
    }
}

#[async_trait]
impl BusAdmin for KafkaBus {
    async fn describe_cluster(&self, timeout: Duration) -> Result<ClusterHealth, BusError> {
        let consumer = self.consumer_for("__health_probe__", "__health_probe__")?;

        match consumer.fetch_metadata(None, timeout) {
            Ok(metadata) => Ok(ClusterHealth::Up {
                cluster_id: metadata.orig_broker_name().to_string(),
                node_count: metadata.brokers().len(),
            }),
            Err(err) => Ok(ClusterHealth::Down {
                error_class: "transport".to_string(),
                message: err.to_string(),
            }),
        }
    }
}
