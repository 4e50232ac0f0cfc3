//! Centralized Testing Utilities
//!
//! Fakes for every driven port plus request/registration fixtures. Available
//! to unit tests and, with the `test-utils` feature, to other crates.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use cv_crypto::{CryptoError, HashedId8};

use crate::domain::{
    CodecError, ConnectionPoint, DiscoveryRequest, GeoRegion, GroupId, LatLon,
    ObjectRegistrationData, Position3D, SemiDialogId, SemiMessage, SemiSequenceId, ServiceRecord,
    StoreError, TemporaryId, TransportError,
};
use crate::ports::{
    CertificateCrypto, Destination, RawRecord, Receipt, ReceiptSink, RegionQuery,
    RegistrationStore, Transport, WireCodec,
};

// =============================================================================
// FIXTURES
// =============================================================================

/// Valid request: `nwPos={1,-10}`, `sePos={-1,10}`, `serviceId=5`, to 127.0.0.1:46753.
pub fn sample_request() -> DiscoveryRequest {
    DiscoveryRequest {
        dialog_id: 161,
        receipt_id: Some("receipt-1".to_string()),
        sequence_id: 1,
        group_id: 0,
        request_id: 1001,
        service_id: 5,
        dest_host: Some("127.0.0.1".to_string()),
        dest_port: 46753,
        from_forwarder: false,
        certificate: None,
        nw_pos: Some(LatLon::new(1.0, -10.0)),
        se_pos: Some(LatLon::new(-1.0, 10.0)),
    }
}

/// JSON form of `sample_request()`.
pub fn sample_request_json() -> String {
    r#"{"dialogId":161,"receiptId":"receipt-1","sequenceId":1,"groupId":0,"requestId":1001,
        "serviceId":5,"destHost":"127.0.0.1","destPort":46753,"fromForwarder":"false",
        "nwPos":{"lat":1.0,"lon":-10.0},"sePos":{"lat":-1.0,"lon":10.0}}"#
        .to_string()
}

/// Registration whose single connection point uses `port` (handy as an ordinal).
pub fn sample_registration(port: u16) -> ObjectRegistrationData {
    ObjectRegistrationData {
        dialog_id: SemiDialogId::ObjReg,
        seq_id: SemiSequenceId::Data,
        group_id: GroupId::default(),
        request_id: TemporaryId::from_request_id(i32::from(port)),
        service_record: ServiceRecord {
            connection_points: vec![ConnectionPoint {
                address: Some(std::net::IpAddr::from([10, 0, 0, 1])),
                port,
            }],
            svc_provider: [0, 0, 0, 1],
            svc_psids: vec![[0, 0, 0x2f, 0xe1]],
            service_region: GeoRegion {
                nw_corner: Position3D::new(5_000_000, -50_000_000),
                se_corner: Position3D::new(-5_000_000, 50_000_000),
            },
        },
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Store returning a fixed document list, optionally slow or failing.
pub struct StaticStore {
    documents: Vec<RawRecord>,
    delay: Option<Duration>,
    failure: Option<StoreError>,
    queries: Mutex<Vec<RegionQuery>>,
}

impl StaticStore {
    pub fn new(documents: Vec<RawRecord>) -> Self {
        Self {
            documents,
            delay: None,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every query.
    #[must_use]
    pub fn failing(mut self, error: StoreError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<RegionQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn query_count(&self) -> usize {
        self.queries().len()
    }
}

#[async_trait]
impl RegistrationStore for StaticStore {
    async fn find_all(&self, query: &RegionQuery) -> Result<Vec<RawRecord>, StoreError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.documents.iter().take(query.limit).cloned().collect())
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Codec that fails every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCodec;

impl WireCodec for FailingCodec {
    fn encode(&self, _message: &SemiMessage) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Encode("injected encode failure".into()))
    }

    fn decode(&self, _bytes: &[u8]) -> Result<SemiMessage, CodecError> {
        Err(CodecError::Decode("injected decode failure".into()))
    }
}

// =============================================================================
// CRYPTO
// =============================================================================

/// Crypto fake: "encrypts" by prefixing `ENC:`.
#[derive(Default)]
pub struct StaticCrypto {
    reject: bool,
    registered: Mutex<Vec<Vec<u8>>>,
}

impl StaticCrypto {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every certificate.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            registered: Mutex::new(Vec::new()),
        }
    }

    /// Certificates registered so far.
    pub fn registered(&self) -> Vec<Vec<u8>> {
        self.registered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl CertificateCrypto for StaticCrypto {
    fn register_certificate(&self, certificate: &[u8]) -> Result<HashedId8, CryptoError> {
        if self.reject {
            return Err(CryptoError::InvalidCertificate("rejected by test".into()));
        }
        if let Ok(mut registered) = self.registered.lock() {
            registered.push(certificate.to_vec());
        }
        Ok(HashedId8::of(certificate))
    }

    fn encrypt(&self, payload: &[u8], _recipient: HashedId8, _psid: u32) -> Result<Vec<u8>, CryptoError> {
        let mut out = b"ENC:".to_vec();
        out.extend_from_slice(payload);
        Ok(out)
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// One datagram handed to `RecordingTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDatagram {
    pub destination: Destination,
    pub payload: Vec<u8>,
    pub relayed: bool,
}

/// Transport that records sends and can fail the first N attempts or hang.
pub struct RecordingTransport {
    fail_first: u32,
    hang: bool,
    attempts: AtomicU32,
    sent: Mutex<VecDeque<SentDatagram>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    /// Fail the first `n` attempts with `TransportError::Io("injected failure <attempt>")`.
    pub fn failing_first(n: u32) -> Self {
        Self {
            fail_first: n,
            hang: false,
            attempts: AtomicU32::new(0),
            sent: Mutex::new(VecDeque::new()),
        }
    }

    /// Never complete a send.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    /// Send attempts, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successfully sent datagrams, oldest first.
    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent
            .lock()
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        destination: &Destination,
        payload: &[u8],
        relayed: bool,
    ) -> Result<(), TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.hang {
            std::future::pending::<()>().await;
        }
        if attempt <= self.fail_first {
            return Err(TransportError::Io(format!("injected failure {attempt}")));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push_back(SentDatagram {
                destination: destination.clone(),
                payload: payload.to_vec(),
                relayed,
            });
        }
        Ok(())
    }
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Receipt sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingReceiptSink {
    receipts: Mutex<Vec<Receipt>>,
    count: AtomicUsize,
}

impl RecordingReceiptSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receipts(&self) -> Vec<Receipt> {
        self.receipts.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReceiptSink for RecordingReceiptSink {
    fn send_receipt(&self, receipt: &Receipt) {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut receipts) = self.receipts.lock() {
            receipts.push(receipt.clone());
        }
    }
}
