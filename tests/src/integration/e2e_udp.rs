//! # End-to-End over UDP
//!
//! Starts the full `DiscoveryRuntime` (seeded store, real sockets) and acts
//! as the requester: sends a discovery request datagram to the intake and
//! waits for the response datagram on its own socket.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tokio::net::UdpSocket;
    use tokio::time::timeout;

    use cv_object_discovery::adapters::{registration_document, BincodeCodec};
    use cv_object_discovery::testing::{sample_registration, sample_request_json};
    use cv_object_discovery::{DiscoveryConfig, SemiMessage, WireCodec};
    use discovery_runtime::DiscoveryRuntime;

    fn seed_file(ports: std::ops::RangeInclusive<u16>) -> tempfile::NamedTempFile {
        let codec = BincodeCodec::new();
        let docs: Vec<_> = ports
            .map(|port| {
                registration_document(&codec, 5, "region", &sample_registration(port), i64::from(port))
                    .unwrap()
            })
            .collect();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&docs).unwrap()).unwrap();
        file
    }

    async fn runtime(seed: &tempfile::NamedTempFile) -> (DiscoveryRuntime, std::net::SocketAddr) {
        let mut config = DiscoveryConfig::default();
        config.intake.bind_addr = "127.0.0.1:0".into();
        config.store.seed_file = Some(seed.path().to_path_buf());
        let mut runtime = DiscoveryRuntime::new(config).await.unwrap();
        let intake = runtime.start().await.unwrap();
        (runtime, intake)
    }

    /// Sample request redirected to `requester`'s port.
    fn request_for(requester: &UdpSocket) -> String {
        let port = requester.local_addr().unwrap().port();
        sample_request_json().replace(r#""destPort":46753"#, &format!(r#""destPort":{port}"#))
    }

    #[tokio::test]
    async fn test_request_datagram_gets_response_datagram() {
        let seed = seed_file(1..=12);
        let (runtime, intake) = runtime(&seed).await;
        let requester = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        requester
            .send_to(request_for(&requester).as_bytes(), intake)
            .await
            .unwrap();

        let mut buf = vec![0u8; 65_536];
        let (len, _) = timeout(Duration::from_secs(5), requester.recv_from(&mut buf))
            .await
            .expect("no response within 5s")
            .unwrap();

        match BincodeCodec::new().decode(&buf[..len]).unwrap() {
            SemiMessage::ObjectDiscovery(data) => {
                assert_eq!(data.service_info.count_records, 10);
                assert_eq!(data.request_id.to_request_id(), 1001);
            }
            other => panic!("unexpected message {}", other.kind()),
        }

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_other_dialog_gets_no_response() {
        let seed = seed_file(1..=2);
        let (runtime, intake) = runtime(&seed).await;
        let requester = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let request = request_for(&requester).replace(r#""dialogId":161"#, r#""dialogId":162"#);
        requester.send_to(request.as_bytes(), intake).await.unwrap();

        let mut buf = vec![0u8; 1024];
        assert!(timeout(Duration::from_millis(300), requester.recv_from(&mut buf))
            .await
            .is_err());

        runtime.shutdown().await;
    }
}
