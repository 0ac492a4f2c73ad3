//! Elasticsearch-backed [`SearchStore`] (§4.7, §6 "Search store index `logs`").
//!
//! A thin `Elasticsearch` handle built from a `Url`, requests built as
//! `serde_json::json!` bodies — the same "wrap the official client
//! directly" approach `logaggr-bus::kafka` takes with `rdkafka`.

use async_trait::async_trait;
use elasticsearch::http::transport::Transport;
use elasticsearch::{BulkOperation, BulkParts, Elasticsearch, SearchParts};
use serde_json::{json, Value};
use tracing::warn;

use logaggr_types::LogDocument;

use crate::criteria::Criteria;
use crate::{SearchStore, SearchStoreError, INDEX_LOGS};

/// A real Elasticsearch-backed [`SearchStore`].
#[derive(Debug)]
pub struct ElasticsearchStore {
    client: Elasticsearch,
}

impl ElasticsearchStore {
    pub fn new(url: &str) -> Result<Self, SearchStoreError> {
        let transport = Transport::single_node(url)
            .map_err(|err| SearchStoreError::Transport(Box::new(err)))?;
        Ok(Self {
            client: Elasticsearch::new(transport),
        })
    }

    /// Builds the query-DSL `bool` clause from the criteria (§4.7): one
    /// `must` entry per present filter, `match_all` when none are set.
    fn query_body(criteria: &Criteria) -> Value {
        if criteria.is_match_all() {
            return json!({ "match_all": {} });
        }

        let mut must = Vec::new();
        if let Some(service_id) = &criteria.service_id {
            must.push(json!({ "term": { "serviceId": service_id } }));
        }
        if let Some(trace_id) = &criteria.trace_id {
            must.push(json!({ "term": { "traceId": trace_id } }));
        }
        if let Some(level) = criteria.level {
            must.push(json!({ "term": { "level": level.as_str() } }));
        }
        if let Some((start, end)) = criteria.time_range {
            must.push(json!({
                "range": {
                    "timestamp": {
                        "gte": start.to_rfc3339(),
                        "lte": end.to_rfc3339(),
                    }
                }
            }));
        }
        if let Some(query) = &criteria.query {
            must.push(json!({ "match": { "message": query } }));
        }

        json!({ "bool": { "must": must } })
    }
}

#[async_trait]
impl SearchStore for ElasticsearchStore {
    async fn bulk_index(&self, documents: Vec<LogDocument>) -> Result<(), SearchStoreError> {
        if documents.is_empty() {
            return Ok(());
        }

        let ops = documents
            .iter()
            .map(|doc| BulkOperation::index(doc).id(&doc.id).into())
            .collect::<Vec<BulkOperation<&LogDocument>>>();

        let response = self
            .client
            .bulk(BulkParts::Index(INDEX_LOGS))
            .body(ops)
            .send()
            .await
            .map_err(|err| SearchStoreError::Transport(Box::new(err)))?;

        if !response.status_code().is_success() {
            return Err(SearchStoreError::Response(format!(
                "bulk index returned {}",
                response.status_code()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| SearchStoreError::Transport(Box::new(err)))?;
        if body["errors"].as_bool().unwrap_or(false) {
            warn!(?body, "elasticsearch bulk index reported per-item errors");
        }
        Ok(())
    }

    async fn query_page(
        &self,
        criteria: &Criteria,
        page: u32,
        size: u32,
    ) -> Result<(Vec<LogDocument>, u64), SearchStoreError> {
        let body = json!({
            "query": Self::query_body(criteria),
            "from": page as u64 * size as u64,
            "size": size,
            "sort": [{ "timestamp": "desc" }],
            "track_total_hits": true,
        });

        let response = self
            .client
            .search(SearchParts::Index(&[INDEX_LOGS]))
            .body(body)
            .send()
            .await
            .map_err(|err| SearchStoreError::Transport(Box::new(err)))?;

        if !response.status_code().is_success() {
            return Err(SearchStoreError::Response(format!(
                "search returned {}",
                response.status_code()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| SearchStoreError::Transport(Box::new(err)))?;

        let total = body["hits"]["total"]["value"].as_u64().unwrap_or(0);
        let hits = body["hits"]["hits"].as_array().cloned().unwrap_or_default();
        let mut documents = Vec::with_capacity(hits.len());
        for hit in hits {
            let source = hit["_source"].clone();
            let doc: LogDocument = serde_json::from_value(source)?;
            documents.push(doc);
        }
        Ok((documents, total))
    }
}
