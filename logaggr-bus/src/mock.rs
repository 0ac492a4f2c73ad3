//! In-memory bus for tests: no network, no broker, just `Vec`s behind a
//! mutex so `Producer`/`BatchConsumer`/`DlqErrorHandler` tests can run
//! without a live Kafka cluster.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{BusAdmin, BusError, BusReading, BusRecord, BusWriting, ClusterHealth};

#[derive(Debug, Default)]
struct Topic {
    records: Vec<BusRecord>,
    next_offset_by_group: HashMap<String, usize>,
}

/// A single-process, single-broker-shaped stand-in for a real bus.
/// Every topic gets one partition (`partition` is always `0` on records
/// produced here); each consumer group tracks its own read cursor.
#[derive(Debug, Default)]
pub struct MockBus {
    topics: Mutex<HashMap<String, Topic>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic_len(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap()
            .get(topic)
            .map(|t| t.records.len())
            .unwrap_or(0)
    }

    pub fn records(&self, topic: &str) -> Vec<BusRecord> {
        self.topics
            .lock()
            .unwrap()
            .get(topic)
            .map(|t| t.records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BusWriting for MockBus {
    async fn send(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let mut topics = self.topics.lock().unwrap();
        let t = topics.entry(topic.to_string()).or_default();
        let offset = t.records.len() as i64;
        t.records.push(BusRecord {
            key: key.to_string(),
            payload,
            partition: 0,
            offset,
        });
        Ok(())
    }
}

#[async_trait]
impl BusReading for MockBus {
    async fn poll_batch(
        &self,
        topic: &str,
        group: &str,
        max_records: usize,
        _linger: Duration,
    ) -> Result<Vec<BusRecord>, BusError> {
        let mut topics = self.topics.lock().unwrap();
        let t = topics.entry(topic.to_string()).or_default();
        let cursor = *t.next_offset_by_group.get(group).unwrap_or(&0);
        let end = (cursor + max_records).min(t.records.len());
        if cursor >= end {
            return Ok(Vec::new());
        }
        let batch = t.records[cursor..end].to_vec();
        t.next_offset_by_group.insert(group.to_string(), end);
        Ok(batch)
    }
}

#[async_trait]
impl BusAdmin for MockBus {
    async fn describe_cluster(&self, _timeout: Duration) -> Result<ClusterHealth, BusError> {
        Ok(ClusterHealth::Up {
            cluster_id: "mock-cluster".to_string(),
            node_count: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn poll_batch_advances_cursor_per_group() {
        let bus = MockBus::new();
        for i in 0..5 {
            bus.send("t", "k", vec![i]).await.unwrap();
        }

        let first = bus.poll_batch("t", "g1", 2, Duration::from_millis(0)).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].offset, 0);

        let second = bus.poll_batch("t", "g1", 2, Duration::from_millis(0)).await.unwrap();
        assert_eq!(second[0].offset, 2);

        // A second, independent group starts from the beginning.
        let other_group = bus.poll_batch("t", "g2", 10, Duration::from_millis(0)).await.unwrap();
        assert_eq!(other_group.len(), 5);
    }

    #[tokio::test]
    async fn poll_batch_returns_empty_past_end() {
        let bus = MockBus::new();
        bus.send("t", "k", vec![1]).await.unwrap();
        let _ = bus.poll_batch("t", "g", 10, Duration::from_millis(0)).await.unwrap();
        let empty = bus.poll_batch("t", "g", 10, Duration::from_millis(0)).await.unwrap();
        assert!(empty.is_empty());
    }
}
