//! # Discovery Response Builder
//!
//! Folds decoded registrations into one `ObjectDiscoveryData`.
//!
//! The wire schema allows 1..=10 service records. Zero matches are
//! answered with a single blank record and `count_records = 0`; more than
//! ten are cut to the first ten in query order.

use tracing::debug;

use crate::domain::messages::{
    ConnectionPoint, GeoRegion, GroupId, ObjectDiscoveryData, ObjectRegistrationData, Position3D,
    SemiDialogId, SemiSequenceId, ServiceInfo, ServiceRecord, TemporaryId, MAX_SERVICE_RECORDS,
};
use crate::domain::request::DiscoveryRequest;

/// Latitude of the blank record's region, the southern limit.
pub const BLANK_REGION_LAT: i32 = -900_000_000;
/// Longitude of the blank record's region, the western limit.
pub const BLANK_REGION_LON: i32 = -1_800_000_000;

/// Zero-valued placeholder used when nothing matched.
pub fn blank_service_record() -> ServiceRecord {
    let corner = Position3D::new(BLANK_REGION_LAT, BLANK_REGION_LON);
    ServiceRecord {
        connection_points: vec![ConnectionPoint {
            address: None,
            port: 0,
        }],
        svc_provider: [0; 4],
        svc_psids: vec![[0; 4]],
        service_region: GeoRegion {
            nw_corner: corner,
            se_corner: corner,
        },
    }
}

/// Build the response for `request` from the matching registrations.
///
/// Pure: records are cloned, never reordered.
pub fn build_discovery_data(
    request: &DiscoveryRequest,
    records: Option<&[ObjectRegistrationData]>,
) -> ObjectDiscoveryData {
    let records = records.unwrap_or_default();

    let service_info = if records.is_empty() {
        debug!(request_id = request.request_id, "No registration records found, sending blank record");
        ServiceInfo {
            count_records: 0,
            service_records: vec![blank_service_record()],
        }
    } else {
        let count = records.len().min(MAX_SERVICE_RECORDS);
        debug!(
            request_id = request.request_id,
            found = records.len(),
            count,
            "Folding registration records"
        );
        ServiceInfo {
            // count <= MAX_SERVICE_RECORDS
            count_records: count as u8,
            service_records: records[..count]
                .iter()
                .map(|r| r.service_record.clone())
                .collect(),
        }
    };

    ObjectDiscoveryData {
        dialog_id: SemiDialogId::ObjDisc,
        seq_id: SemiSequenceId::Data,
        request_id: TemporaryId::from_request_id(request.request_id),
        group_id: GroupId::from_group_id(request.group_id),
        service_info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::LatLon;

    fn request() -> DiscoveryRequest {
        DiscoveryRequest {
            dialog_id: 161,
            receipt_id: None,
            sequence_id: 1,
            group_id: 9,
            request_id: 77,
            service_id: 5,
            dest_host: Some("127.0.0.1".into()),
            dest_port: 46753,
            from_forwarder: false,
            certificate: None,
            nw_pos: Some(LatLon::new(1.0, -10.0)),
            se_pos: Some(LatLon::new(-1.0, 10.0)),
        }
    }

    fn registration(port: u16) -> ObjectRegistrationData {
        ObjectRegistrationData {
            dialog_id: SemiDialogId::ObjReg,
            seq_id: SemiSequenceId::Data,
            group_id: GroupId::default(),
            request_id: TemporaryId::from_request_id(i32::from(port)),
            service_record: ServiceRecord {
                connection_points: vec![ConnectionPoint {
                    address: Some("10.1.1.1".parse().unwrap()),
                    port,
                }],
                svc_provider: [0, 0, 0, 1],
                svc_psids: vec![[0, 0, 0x2f, 0xe1]],
                service_region: GeoRegion {
                    nw_corner: Position3D::new(10_000_000, -100_000_000),
                    se_corner: Position3D::new(-10_000_000, 100_000_000),
                },
            },
        }
    }

    #[test]
    fn test_header_from_request() {
        let data = build_discovery_data(&request(), None);
        assert_eq!(data.dialog_id, SemiDialogId::ObjDisc);
        assert_eq!(data.seq_id, SemiSequenceId::Data);
        assert_eq!(data.request_id, TemporaryId::from_request_id(77));
        assert_eq!(data.group_id, GroupId([0, 0, 0, 9]));
    }

    #[test]
    fn test_empty_yields_single_blank_record() {
        for records in [None, Some(&[][..])] {
            let data = build_discovery_data(&request(), records);
            let info = &data.service_info;

            assert_eq!(info.count_records, 0);
            assert_eq!(info.service_records.len(), 1);
            let blank = &info.service_records[0];
            assert_eq!(blank.connection_points[0].port, 0);
            assert_eq!(blank.connection_points[0].address, None);
            assert_eq!(blank.svc_provider, [0; 4]);
            assert_eq!(blank.svc_psids, vec![[0; 4]]);
            assert_eq!(blank.service_region.nw_corner.lat, BLANK_REGION_LAT);
            assert_eq!(blank.service_region.se_corner.lon, BLANK_REGION_LON);
        }
    }

    #[test]
    fn test_up_to_ten_records_kept_in_order() {
        for n in 1..=10u16 {
            let records: Vec<_> = (1..=n).map(registration).collect();
            let data = build_discovery_data(&request(), Some(&records));

            assert_eq!(usize::from(data.service_info.count_records), usize::from(n));
            let ports: Vec<u16> = data
                .service_info
                .service_records
                .iter()
                .map(|r| r.connection_points[0].port)
                .collect();
            assert_eq!(ports, (1..=n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_more_than_ten_truncated_to_first_ten() {
        let records: Vec<_> = (1..=12).map(registration).collect();
        let data = build_discovery_data(&request(), Some(&records));

        assert_eq!(data.service_info.count_records, 10);
        assert_eq!(data.service_info.service_records.len(), 10);
        assert_eq!(data.service_info.service_records[0], records[0].service_record);
        assert_eq!(data.service_info.service_records[9], records[9].service_record);
        // input untouched
        assert_eq!(records.len(), 12);
    }
}
