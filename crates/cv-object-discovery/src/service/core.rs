use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::{
    build_discovery_data, peek_dialog_id, BoundingBox, DiscoveryConfig, DiscoveryError,
    DiscoveryRequest, RequestError, StoreError, DISCOVERY_DIALOG_ID, MAX_RECORDS, TIMESTAMP_FIELD,
};
use crate::ports::{
    CertificateCrypto, DiscoveryApi, Outcome, RawRecord, Receipt, ReceiptSink, RegionQuery,
    RegistrationStore, Transport, WireCodec,
};
use crate::service::decoder::RecordDecoder;
use crate::service::dispatcher::SecureDispatcher;

/// Adapters the service is wired with.
#[derive(Clone)]
pub struct DiscoveryPorts {
    pub store: Arc<dyn RegistrationStore>,
    pub codec: Arc<dyn WireCodec>,
    pub crypto: Arc<dyn CertificateCrypto>,
    pub transport: Arc<dyn Transport>,
    pub receipts: Arc<dyn ReceiptSink>,
}

/// Object discovery pipeline.
///
/// Request in, at most one response datagram and one receipt out:
///
/// ```text
/// validate -> bounding box -> store query -> decode -> fold -> dispatch -> receipt
/// ```
///
/// Holds no per-request state, so one instance serves concurrent requests.
///
/// # Example
///
/// ```rust,ignore
/// let service = ObjectDiscoveryService::new(config, ports);
/// match service.handle(raw_json).await? {
///     Outcome::Responded { count_records, .. } => { /* sent */ }
///     Outcome::Ignored { dialog_id } => { /* other dialog */ }
/// }
/// ```
pub struct ObjectDiscoveryService {
    config: DiscoveryConfig,
    store: Arc<dyn RegistrationStore>,
    receipts: Arc<dyn ReceiptSink>,
    decoder: RecordDecoder,
    dispatcher: SecureDispatcher,
}

impl ObjectDiscoveryService {
    pub fn new(config: DiscoveryConfig, ports: DiscoveryPorts) -> Self {
        let decoder = RecordDecoder::new(Arc::clone(&ports.codec));
        let dispatcher = SecureDispatcher::new(
            ports.codec,
            ports.crypto,
            ports.transport,
            config.dispatch.clone(),
        );
        Self {
            config,
            store: ports.store,
            receipts: ports.receipts,
            decoder,
            dispatcher,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run a request and log any failure with the raw payload.
    ///
    /// Top-level entry for request sources: a failing request never
    /// propagates past here.
    pub async fn process(&self, raw: &str) -> Option<Outcome> {
        match self.handle(raw).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, request = raw, "Failed to process discovery request");
                None
            }
        }
    }

    fn region_query(&self, request: &DiscoveryRequest, bounds: &BoundingBox) -> RegionQuery {
        RegionQuery {
            database: self.config.store.database_name.clone(),
            collection: self.config.store.collection_name.clone(),
            service_id: request.service_id,
            geo_field: self.config.store.geospatial_field_name.clone(),
            polygon: bounds.to_polygon(),
            sort_field: TIMESTAMP_FIELD.to_string(),
            limit: MAX_RECORDS,
        }
    }

    async fn query_store(&self, query: &RegionQuery) -> Result<Vec<RawRecord>, StoreError> {
        let timeout = self.config.store.query_timeout;
        match tokio::time::timeout(timeout, self.store.find_all(query)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn respond(&self, request: DiscoveryRequest) -> Result<Outcome, DiscoveryError> {
        request.validate()?;

        // validate() guarantees both corners
        let (nw, se) = match (request.nw_pos, request.se_pos) {
            (Some(nw), Some(se)) => (nw, se),
            _ => return Err(RequestError::MissingCorner { corner: "northwest" }.into()),
        };
        let bounds = BoundingBox::new(nw, se)?;

        let query = self.region_query(&request, &bounds);
        debug!(
            request_id = request.request_id,
            service_id = request.service_id,
            database = %query.database,
            collection = %query.collection,
            "Running Object Discover Query"
        );
        let raw = self.query_store(&query).await?;
        debug!(request_id = request.request_id, results = raw.len(), "Query results");

        let records = self.decoder.decode_all(&raw)?;
        let response = build_discovery_data(&request, Some(&records));
        let count_records = response.service_info.count_records;

        let report = self.dispatcher.send(&request, &response).await?;
        info!(
            request_id = request.request_id,
            count = count_records,
            attempts = report.attempts,
            protection = ?report.protection,
            "Sent Object Discovery data"
        );

        self.receipts.send_receipt(&Receipt {
            receipt_id: request.receipt_id.clone(),
            request_id: request.request_id,
            group_id: request.group_id,
            count_records,
        });

        Ok(Outcome::Responded {
            request_id: request.request_id,
            count_records,
            report,
        })
    }
}

#[async_trait]
impl DiscoveryApi for ObjectDiscoveryService {
    async fn handle(&self, raw: &str) -> Result<Outcome, DiscoveryError> {
        debug!(request = raw, "Processing discovery request");

        let dialog_id = peek_dialog_id(raw)?;
        if dialog_id != DISCOVERY_DIALOG_ID {
            error!(
                dialog_id,
                expected = DISCOVERY_DIALOG_ID,
                "Received unexpected dialogId"
            );
            return Ok(Outcome::Ignored { dialog_id });
        }

        let request = DiscoveryRequest::from_json(raw)?;
        self.respond(request).await
    }
}
