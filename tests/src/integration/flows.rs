//! # Integration Test Flows
//!
//! Runs `ObjectDiscoveryService` over the real bincode codec, in-memory
//! registration store and certificate registry. Only the transport and the
//! receipt sink are recording fakes.
//!
//! ## Flows Tested:
//!
//! 1. **Region query**: stored registrations inside the box come back, oldest first, capped at 10
//! 2. **Recipient encryption**: a request carrying a certificate gets a sealed envelope only its key opens
//! 3. **Plaintext fallback**: an unusable certificate still gets an answer unless strict

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use cv_crypto::{open, RecipientKeyPair, DEFAULT_PSID};
    use cv_object_discovery::adapters::{
        registration_document, BincodeCodec, InMemoryRegistrationStore, RegistryCrypto,
    };
    use cv_object_discovery::domain::{
        ConnectionPoint, GeoRegion, ObjectDiscoveryData, Position3D, TemporaryId,
    };
    use cv_object_discovery::testing::{
        sample_registration, sample_request_json, RecordingReceiptSink, RecordingTransport,
    };
    use cv_object_discovery::{
        DiscoveryApi, DiscoveryConfig, DiscoveryError, DiscoveryPorts, DispatchError,
        ObjectDiscoveryService, Outcome, Protection, SemiMessage, WireCodec,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Pipeline {
        service: ObjectDiscoveryService,
        store: Arc<InMemoryRegistrationStore>,
        crypto: Arc<RegistryCrypto>,
        transport: Arc<RecordingTransport>,
        receipts: Arc<RecordingReceiptSink>,
    }

    fn pipeline(config: DiscoveryConfig) -> Pipeline {
        let store = Arc::new(InMemoryRegistrationStore::new());
        let crypto = Arc::new(RegistryCrypto::new());
        let transport = Arc::new(RecordingTransport::new());
        let receipts = Arc::new(RecordingReceiptSink::new());
        let ports = DiscoveryPorts {
            store: store.clone(),
            codec: Arc::new(BincodeCodec::new()),
            crypto: crypto.clone(),
            transport: transport.clone(),
            receipts: receipts.clone(),
        };
        Pipeline {
            service: ObjectDiscoveryService::new(config, ports),
            store,
            crypto,
            transport,
            receipts,
        }
    }

    fn default_pipeline() -> Pipeline {
        let mut config = DiscoveryConfig::default();
        config.dispatch = config.dispatch.without_delays();
        pipeline(config)
    }

    /// Register a provider for service `service_id` at `timestamp`; `port` tags it.
    fn register(p: &Pipeline, service_id: i64, port: u16, timestamp: i64) {
        let doc = registration_document(
            &BincodeCodec::new(),
            service_id,
            "region",
            &sample_registration(port),
            timestamp,
        )
        .unwrap();
        p.store.insert(doc);
    }

    /// Provider whose service region sits far outside the sample request box.
    fn register_far_away(p: &Pipeline, port: u16) {
        let mut registration = sample_registration(port);
        registration.service_record.service_region = GeoRegion {
            nw_corner: Position3D::new(450_000_000, 1_000_000_000),
            se_corner: Position3D::new(440_000_000, 1_010_000_000),
        };
        let doc = registration_document(&BincodeCodec::new(), 5, "region", &registration, 0).unwrap();
        p.store.insert(doc);
    }

    fn decode_response(bytes: &[u8]) -> ObjectDiscoveryData {
        match BincodeCodec::new().decode(bytes).unwrap() {
            SemiMessage::ObjectDiscovery(data) => data,
            other => panic!("unexpected message {}", other.kind()),
        }
    }

    fn ports_of(data: &ObjectDiscoveryData) -> Vec<u16> {
        data.service_info
            .service_records
            .iter()
            .flat_map(|r| r.connection_points.iter().map(|c: &ConnectionPoint| c.port))
            .collect()
    }

    fn with_certificate(certificate: &[u8]) -> String {
        sample_request_json().replacen(
            '{',
            &format!(r#"{{"certificate":"{}","#, STANDARD.encode(certificate)),
            1,
        )
    }

    // =============================================================================
    // REGION QUERY
    // =============================================================================

    #[tokio::test]
    async fn test_twelve_providers_fold_to_ten_oldest() {
        let p = default_pipeline();
        // inserted newest first so the sort is exercised
        for port in (1..=12u16).rev() {
            register(&p, 5, port, i64::from(port));
        }

        let outcome = p.service.handle(&sample_request_json()).await.unwrap();

        assert!(matches!(outcome, Outcome::Responded { count_records: 10, .. }));
        assert_eq!(p.transport.attempts(), 1);
        let response = decode_response(&p.transport.sent()[0].payload);
        assert_eq!(ports_of(&response), (1..=10).collect::<Vec<_>>());
        assert_eq!(response.request_id, TemporaryId::from_request_id(1001));
    }

    #[tokio::test]
    async fn test_only_matching_service_and_region() {
        let p = default_pipeline();
        register(&p, 5, 1, 10);
        register(&p, 7, 2, 11);
        register_far_away(&p, 3);
        register(&p, 5, 4, 12);

        p.service.handle(&sample_request_json()).await.unwrap();

        let response = decode_response(&p.transport.sent()[0].payload);
        assert_eq!(ports_of(&response), vec![1, 4]);
        assert_eq!(p.receipts.receipts()[0].count_records, 2);
    }

    #[tokio::test]
    async fn test_empty_region_answers_with_blank_record() {
        let p = default_pipeline();
        register_far_away(&p, 3);

        p.service.handle(&sample_request_json()).await.unwrap();

        let response = decode_response(&p.transport.sent()[0].payload);
        assert_eq!(response.service_info.count_records, 0);
        assert_eq!(response.service_info.service_records.len(), 1);
        assert_eq!(
            response.service_info.service_records[0],
            cv_object_discovery::blank_service_record()
        );
    }

    // =============================================================================
    // RECIPIENT ENCRYPTION
    // =============================================================================

    #[tokio::test]
    async fn test_certificate_request_gets_sealed_response() {
        let p = default_pipeline();
        register(&p, 5, 1, 1);
        let keys = RecipientKeyPair::generate();

        let outcome = p
            .service
            .handle(&with_certificate(&keys.certificate_bytes()))
            .await
            .unwrap();

        match outcome {
            Outcome::Responded { report, .. } => assert_eq!(report.protection, Protection::Encrypted),
            other => panic!("expected a response, got {other:?}"),
        }
        assert!(p.crypto.registry().contains(&keys.certificate_id()));

        let payload = &p.transport.sent()[0].payload;
        let opened = open(&keys, payload).unwrap();
        assert_eq!(opened.psid, DEFAULT_PSID);
        assert_eq!(ports_of(&decode_response(&opened.plaintext)), vec![1]);

        // a different key cannot open it
        assert!(open(&RecipientKeyPair::generate(), payload).is_err());
    }

    #[tokio::test]
    async fn test_bad_certificate_falls_back_to_plaintext() {
        let p = default_pipeline();
        register(&p, 5, 1, 1);

        let outcome = p.service.handle(&with_certificate(b"garbage")).await.unwrap();

        match outcome {
            Outcome::Responded { report, .. } => {
                assert_eq!(report.protection, Protection::PlaintextFallback)
            }
            other => panic!("expected a response, got {other:?}"),
        }
        assert_eq!(ports_of(&decode_response(&p.transport.sent()[0].payload)), vec![1]);
    }

    #[tokio::test]
    async fn test_strict_mode_refuses_plaintext() {
        let mut config = DiscoveryConfig::default();
        config.dispatch = config.dispatch.without_delays().strict();
        let p = pipeline(config);

        let err = p.service.handle(&with_certificate(b"garbage")).await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Dispatch(DispatchError::Encryption(_))));
        assert_eq!(p.transport.attempts(), 0);
        assert_eq!(p.receipts.count(), 0);
    }
}
