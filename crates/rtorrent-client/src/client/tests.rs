//! Tests for the RTorrentClient.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rtorrent_types::{InfoHash, Label, RTorrent, RTorrentError, TrackerType, View};

use super::RTorrentClient;
use crate::codec::Value;
use crate::testutil::{
    HASH, NAME, SIZE, body_text, fault_response, multicall_response, response, torrent_fields,
    torrent_row,
};
use crate::transport::MockTransport;

fn client_returning(body: String) -> RTorrentClient<MockTransport> {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .times(1)
        .returning(move |_| Ok(body.clone().into_bytes()));
    RTorrentClient::with_transport(mock)
}

fn hash() -> InfoHash {
    InfoHash::new(HASH)
}

#[test]
fn test_ip() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| body_text(body).contains("<methodName>network.bind_address</methodName>"))
        .times(1)
        .returning(|_| Ok(response(&[Value::from("0.0.0.0")]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    assert_eq!(client.ip().unwrap(), "0.0.0.0");
}

#[test]
fn test_name() {
    let client = client_returning(response(&[Value::from("seedbox")]));

    assert_eq!(client.name().unwrap(), "seedbox");
}

#[test]
fn test_name_with_wrong_type_is_a_mapping_error() {
    let client = client_returning(response(&[Value::Int(1)]));

    assert!(matches!(client.name(), Err(RTorrentError::Mapping(_))));
}

#[test_log::test]
fn test_totals_and_rates() {
    let mut mock = MockTransport::new();
    for (method, value) in [
        ("throttle.global_down.total", 3_000_000_000i64),
        ("throttle.global_up.total", 42),
        ("throttle.global_down.rate", 1_024),
        ("throttle.global_up.rate", 0),
    ] {
        let name = format!("<methodName>{method}</methodName>");
        mock.expect_send()
            .withf(move |body| body_text(body).contains(&name))
            .times(1)
            .returning(move |_| Ok(response(&[Value::Int(value)]).into_bytes()));
    }

    let client = RTorrentClient::with_transport(mock);

    assert_eq!(client.down_total().unwrap(), 3_000_000_000);
    assert_eq!(client.up_total().unwrap(), 42);
    assert_eq!(client.down_rate().unwrap(), 1_024);
    assert_eq!(client.up_rate().unwrap(), 0);
}

#[test]
fn test_torrents_in_view() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>d.multicall2</methodName>")
                && body.contains("<string>stopped</string>")
                && body.contains("<string>d.hash=</string>")
                && body.contains("<string>d.timestamp.finished=</string>")
        })
        .times(1)
        .returning(|_| {
            Ok(response(&[Value::Array(vec![
                torrent_row(HASH, NAME, "", ""),
                torrent_row("D2B9E3E5A3B1FF0A7E6D0E4C3B2A1F0E9D8C7B6A", "other", "linux", ""),
            ])])
            .into_bytes())
        });

    let client = RTorrentClient::with_transport(mock);
    let torrents = client.torrents(&View::Stopped).unwrap();

    assert_eq!(torrents.len(), 2);
    assert_eq!(torrents[0].hash, HASH);
    assert_eq!(torrents[0].name, NAME);
    assert_eq!(torrents[0].size, SIZE as u64);
    assert_eq!(torrents[1].label, "linux");
}

#[test]
fn test_torrents_empty_view() {
    let client = client_returning(response(&[Value::Array(Vec::new())]));

    assert!(client.torrents(&View::Main).unwrap().is_empty());
}

#[test_log::test]
fn test_torrent_by_hash() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>system.multicall</methodName>")
                && body.contains("<string>d.custom1</string>")
                && body.contains(HASH)
        })
        .times(1)
        .returning(|_| {
            let results = torrent_fields(HASH, NAME, "ubuntu", "/downloads/ubuntu")
                .into_iter()
                .map(Ok)
                .collect();
            Ok(multicall_response(results).into_bytes())
        });

    let client = RTorrentClient::with_transport(mock);
    let torrent = client.torrent(&InfoHash::new(HASH.to_lowercase())).unwrap();

    assert_eq!(torrent.hash, HASH);
    assert_eq!(torrent.label, "ubuntu");
    assert_eq!(torrent.path, "/downloads/ubuntu");
    assert_eq!(torrent.ratio, 1.5);
}

#[test_log::test]
fn test_torrent_unknown_hash() {
    let results = (0..10)
        .map(|_| Err((-501, "Could not find info-hash.")))
        .collect();
    let client = client_returning(multicall_response(results));

    match client.torrent(&hash()) {
        Err(RTorrentError::Fault(fault)) => assert!(fault.is_unknown_hash()),
        other => panic!("Expected Fault, got {other:?}"),
    }
}

#[test]
fn test_files() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>f.multicall</methodName>")
                && body.contains("<string>f.path=</string>")
                && body.contains("<string>f.size_bytes=</string>")
        })
        .times(1)
        .returning(|_| {
            Ok(response(&[Value::Array(vec![Value::Array(vec![
                Value::from(NAME),
                Value::Int(SIZE),
            ])])])
            .into_bytes())
        });

    let client = RTorrentClient::with_transport(mock);
    let files = client.files(&hash()).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, NAME);
    assert_eq!(files[0].size, SIZE as u64);
}

#[test]
fn test_trackers() {
    let client = client_returning(response(&[Value::Array(vec![
        Value::Array(vec![
            Value::from("https://torrent.ubuntu.com/announce"),
            Value::Int(1),
            Value::Int(1),
            Value::Int(0),
            Value::Int(12),
            Value::Int(1_613_743_900),
        ]),
        Value::Array(vec![
            Value::from("dht://"),
            Value::Int(3),
            Value::Int(1),
            Value::Int(0),
            Value::Int(0),
            Value::Int(0),
        ]),
    ])]));

    let trackers = client.trackers(&hash()).unwrap();

    assert_eq!(trackers.len(), 2);
    assert_eq!(trackers[0].kind, TrackerType::Http);
    assert_eq!(trackers[0].peers, 12);
    assert_eq!(trackers[1].kind, TrackerType::Dht);
    assert_eq!(trackers[1].last_announce_attempt, None);
}

#[test]
fn test_status() {
    let client = client_returning(multicall_response(vec![
        Ok(Value::Int(0)),
        Ok(Value::Int(65_536)),
        Ok(Value::Int(2_048)),
        Ok(Value::Int(16)),
        Ok(Value::Int(SIZE)),
        Ok(Value::Int(250)),
    ]));

    let status = client.status(&hash()).unwrap();

    assert!(!status.completed);
    assert_eq!(status.completed_bytes, 65_536);
    assert_eq!(status.down_rate, 2_048);
    assert_eq!(status.up_rate, 16);
    assert_eq!(status.size, SIZE as u64);
    assert_eq!(status.ratio, 0.25);
}

#[test]
fn test_add_by_url() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>load.start</methodName>")
                && body.contains("<param><value><string></string></value></param>")
                && body.contains("<string>http://example.com/x.torrent</string>")
        })
        .times(1)
        .returning(|_| Ok(response(&[Value::Int(0)]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    client.add("http://example.com/x.torrent").unwrap();
}

#[test]
fn test_add_stopped_with_label() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>load.normal</methodName>")
                && body.contains("d.custom1.set=&quot;my label&quot;")
        })
        .times(1)
        .returning(|_| Ok(response(&[Value::Int(0)]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    client
        .add_stopped("http://example.com/x.torrent", Some(&Label::new("my label")))
        .unwrap();
}

#[test]
fn test_add_stopped_without_label_sends_two_params() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>load.normal</methodName>")
                && body.matches("<param>").count() == 2
        })
        .times(1)
        .returning(|_| Ok(response(&[Value::Int(0)]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    client.add_stopped("http://example.com/x.torrent", None).unwrap();
}

#[test]
fn test_add_torrent_uploads_base64() {
    let data = b"d8:announce3:fooe".to_vec();
    let encoded = format!("<base64>{}</base64>", STANDARD.encode(&data));

    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(move |body| {
            let body = body_text(body);
            body.contains("<methodName>load.raw_start</methodName>") && body.contains(&encoded)
        })
        .times(1)
        .returning(|_| Ok(response(&[Value::Int(0)]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    client.add_torrent(&data).unwrap();
}

#[test]
fn test_add_torrent_stopped_with_label() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>load.raw</methodName>")
                && body.contains("<base64>")
                && body.contains("d.custom1.set=&quot;tv&quot;")
        })
        .times(1)
        .returning(|_| Ok(response(&[Value::Int(0)]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    client
        .add_torrent_stopped(b"d4:infod4:name1:xee", Some(&Label::new("tv")))
        .unwrap();
}

#[test]
fn test_set_label() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| {
            let body = body_text(body);
            body.contains("<methodName>d.custom1.set</methodName>")
                && body.contains(HASH)
                && body.contains("<string>linux</string>")
        })
        .times(1)
        .returning(|_| Ok(response(&[Value::from("linux")]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    client.set_label(&hash(), "linux").unwrap();
}

#[test]
fn test_commands_use_their_procedure() {
    let cases: [(&str, fn(&RTorrentClient<MockTransport>, &InfoHash) -> Result<(), RTorrentError>); 8] = [
        ("d.tracker_announce", |c, h| c.reannounce(h)),
        ("d.erase", |c, h| c.delete(h)),
        ("d.start", |c, h| c.start(h)),
        ("d.stop", |c, h| c.stop(h)),
        ("d.pause", |c, h| c.pause(h)),
        ("d.resume", |c, h| c.resume(h)),
        ("d.open", |c, h| c.open(h)),
        ("d.close", |c, h| c.close(h)),
    ];

    for (method, command) in cases {
        let name = format!("<methodName>{method}</methodName>");
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(move |body| body_text(body).contains(&name) && body_text(body).contains(HASH))
            .times(1)
            .returning(|_| Ok(response(&[Value::Int(0)]).into_bytes()));

        let client = RTorrentClient::with_transport(mock);

        command(&client, &hash()).unwrap();
    }
}

#[test]
fn test_delete_unknown_hash() {
    let client = client_returning(fault_response(-501, "Could not find info-hash."));

    match client.delete(&hash()) {
        Err(RTorrentError::Fault(fault)) => {
            assert_eq!(fault.code, -501);
            assert!(fault.is_unknown_hash());
        }
        other => panic!("Expected Fault, got {other:?}"),
    }
}

#[test_log::test]
fn test_state_flags() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|body| body_text(body).contains("<methodName>d.is_open</methodName>"))
        .returning(|_| Ok(response(&[Value::Int(1)]).into_bytes()));
    mock.expect_send()
        .withf(|body| body_text(body).contains("<methodName>d.is_active</methodName>"))
        .returning(|_| Ok(response(&[Value::Bool(false)]).into_bytes()));
    mock.expect_send()
        .withf(|body| body_text(body).contains("<methodName>d.state</methodName>"))
        .returning(|_| Ok(response(&[Value::Int(1)]).into_bytes()));

    let client = RTorrentClient::with_transport(mock);

    assert!(client.is_open(&hash()).unwrap());
    assert!(!client.is_active(&hash()).unwrap());
    assert_eq!(client.state(&hash()).unwrap(), 1);
}

#[test]
fn test_transport_error_propagates() {
    let mut mock = MockTransport::new();
    mock.expect_send().returning(|_| {
        Err(RTorrentError::Transport {
            status: Some(401),
            message: "unauthorized".into(),
        })
    });

    let client = RTorrentClient::with_transport(mock);

    match client.torrents(&View::Main) {
        Err(RTorrentError::Transport { status, .. }) => assert_eq!(status, Some(401)),
        other => panic!("Expected Transport error, got {other:?}"),
    }
}

#[test]
fn test_execute_exposes_the_batcher() {
    let client = client_returning(multicall_response(vec![
        Ok(Value::from("0.0.0.0")),
        Err((-506, "Method 'nope' not defined")),
    ]));

    let results = client
        .execute(&[
            crate::codec::Call::new("network.bind_address", Vec::new()),
            crate::codec::Call::new("nope", Vec::new()),
        ])
        .unwrap();

    assert_eq!(results[0], Ok(Value::from("0.0.0.0")));
    assert_eq!(results[1].as_ref().unwrap_err().code, -506);
}

#[test]
fn test_execute_keeps_non_utf8_names_exact() {
    let mut mock = MockTransport::new();
    mock.expect_send().times(1).returning(|_| {
        Ok(b"<methodResponse><params><param><value><string>caf\xE9.iso</string></value></param></params></methodResponse>".to_vec())
    });
    let client = RTorrentClient::with_transport(mock);

    let results = client
        .execute(&[crate::codec::Call::new("d.name", vec![HASH.into()])])
        .unwrap();

    let name = results[0].as_ref().unwrap().as_raw_str().unwrap();
    assert_eq!(name.as_bytes(), b"caf\xE9.iso");
}

#[test_log::test]
fn test_unencodable_label_is_not_sent() {
    let mut mock = MockTransport::new();
    mock.expect_send().never();
    let client = RTorrentClient::with_transport(mock);

    assert!(matches!(
        client.set_label(&hash(), "bad\u{0}label"),
        Err(RTorrentError::Encode(_))
    ));
}

#[test]
fn test_new_rejects_invalid_endpoint() {
    assert!(matches!(
        RTorrentClient::new("::not a url::", false),
        Err(RTorrentError::InvalidEndpoint(_))
    ));
}
