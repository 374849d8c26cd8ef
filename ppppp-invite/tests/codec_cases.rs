//! Parse and encode behaviour across protocol revisions.

use ppppp_invite::{
    parse_uri, uri_from_display_url, Codec, Command, HostFormat, InviteConfig, InviteError,
    InviteErrorCode, IssuerKind, JoinAddress, PromiseCommand, ProtocolRevision, TunnelAddress,
    UnknownCommandPolicy,
};

fn assert_malformed(codec: &Codec, uri: &str) {
    match codec.parse(uri) {
        Err(err @ InviteError::MalformedUri { .. }) => {
            assert_eq!(err.code(), InviteErrorCode::MalformedUri)
        }
        other => panic!("expected malformed URI for {}, got {:?}", uri, other),
    }
}

#[test]
fn test_parse_self_invite() {
    let commands = parse_uri(
        "ppppp://invite/join/ip6/::1/tcp/8008/shse/PUBKEY.TOKEN/tunnel-connect/PUBKEY/SELF/promise.account-add/account.ACCOUNT/PROMISE",
    )
    .unwrap();

    assert_eq!(
        commands,
        vec![
            Command::Join(JoinAddress::new(HostFormat::Ip6, "::1", 8008, "PUBKEY").with_token("TOKEN")),
            Command::TunnelConnect(TunnelAddress::new("PUBKEY", "SELF")),
            Command::PromiseAccountAdd(PromiseCommand::new(IssuerKind::Account, "ACCOUNT", "PROMISE")),
        ]
    );
    assert_eq!(
        commands[1].multiserver_address().unwrap(),
        "tunnel:PUBKEY:SELF~shse:SELF"
    );
}

#[test]
fn test_join_arity() {
    let codec = Codec::default();
    assert_malformed(&codec, "ppppp://invite/join/dns/example.com/tcp/8080/shse");
    assert_malformed(&codec, "ppppp://invite/join/dns/example.com/tcp/8080/shse/");
    assert_malformed(&codec, "ppppp://invite/join");

    let flat = Codec::new(ProtocolRevision::V1);
    assert_malformed(&flat, "ppppp://invite/join/example.com/8008/PUBKEY");
    assert_malformed(&flat, "ppppp://invite/join/example.com/8008/PUBKEY//follow/ALICE");
}

#[test]
fn test_other_command_arity() {
    let codec = Codec::default();
    assert_malformed(&codec, "ppppp://invite/follow");
    assert_malformed(&codec, "ppppp://invite/follow/");
    assert_malformed(&codec, "ppppp://invite/tunnel-connect/HUB");
    assert_malformed(&codec, "ppppp://invite/promise.follow/account.ALICE");
    assert_malformed(&codec, "ppppp://invite/promise.account-add");
}

#[test]
fn test_host_coherence() {
    let codec = Codec::default();
    assert_malformed(&codec, "ppppp://invite/join/dns/localhost/tcp/8080/shse/KEY");
    assert_malformed(&codec, "ppppp://invite/join/ip4/example.com/tcp/8080/shse/KEY");
    assert_malformed(&codec, "ppppp://invite/join/ip4/::1/tcp/8080/shse/KEY");
    assert_malformed(&codec, "ppppp://invite/join/ip6/10.0.0.1/tcp/8080/shse/KEY");
    assert_malformed(&codec, "ppppp://invite/join/onion/example.onion/tcp/8080/shse/KEY");

    // Flat joins predate host-format tags and accept dotless names.
    let flat = Codec::new(ProtocolRevision::V1);
    let commands = flat
        .parse("ppppp://invite/join/localhost/8008/KEY/TOKEN")
        .unwrap();
    assert!(matches!(&commands[0], Command::Join(join) if join.host_format == HostFormat::Dns));
}

#[test]
fn test_transport_and_transform() {
    let codec = Codec::default();
    assert_malformed(&codec, "ppppp://invite/join/dns/example.com/udp/8080/shse/KEY");
    assert_malformed(&codec, "ppppp://invite/join/dns/example.com/tcp/8080/noise/KEY");
}

#[test]
fn test_port_bounds() {
    let codec = Codec::default();
    for port in ["0", "8080", "65535"] {
        let uri = format!("ppppp://invite/join/dns/example.com/tcp/{}/shse/KEY", port);
        assert!(codec.parse(&uri).is_ok(), "rejected port {}", port);
    }
    for port in ["65536", "-1", "+80", "80a", "PORT"] {
        let uri = format!("ppppp://invite/join/dns/example.com/tcp/{}/shse/KEY", port);
        assert_malformed(&codec, &uri);
    }
}

#[test]
fn test_issuer_kind_per_revision() {
    let cases = [
        (ProtocolRevision::V1, "identity"),
        (ProtocolRevision::V2, "pubkey"),
        (ProtocolRevision::V3, "account"),
    ];
    for (revision, accepted) in cases {
        let codec = Codec::new(revision);
        for kind in ["identity", "pubkey", "account", "feed"] {
            let uri = format!("ppppp://invite/promise.follow/{}.ALICE/TOKEN", kind);
            let result = codec.parse(&uri);
            if kind == accepted {
                assert!(result.is_ok(), "{} rejected {}", revision, kind);
            } else {
                assert!(result.is_err(), "{} accepted {}", revision, kind);
            }
        }
        assert_malformed(
            &codec,
            &format!("ppppp://invite/promise.follow/{}./TOKEN", accepted),
        );
        assert_malformed(&codec, "ppppp://invite/promise.follow/ALICE/TOKEN");
    }
}

#[test]
fn test_credential_separator_per_revision() {
    let v2 = Codec::new(ProtocolRevision::V2);
    let v3 = Codec::new(ProtocolRevision::V3);

    let colon = "ppppp://invite/join/dns/example.com/tcp/8080/shse/KEY:TOKEN";
    let dot = "ppppp://invite/join/dns/example.com/tcp/8080/shse/KEY.TOKEN";

    assert!(v2.parse(colon).is_ok());
    assert_malformed(&v2, dot);
    assert!(v3.parse(dot).is_ok());
    assert_malformed(&v3, colon);
}

#[test]
fn test_tokenless_join_per_revision() {
    let uri = "ppppp://invite/join/dns/example.com/tcp/8080/shse/PUBKEY";
    for revision in [ProtocolRevision::V2, ProtocolRevision::V3] {
        let commands = Codec::new(revision).parse(uri).unwrap();
        assert_eq!(commands.len(), 1);
        assert!(matches!(&commands[0], Command::Join(join) if join.token.is_none()));
    }
}

#[test]
fn test_encode_unsupported_in_revision() {
    let tokenless = Command::Join(JoinAddress::new(HostFormat::Dns, "example.com", 8008, "KEY"));
    let err = Codec::new(ProtocolRevision::V1)
        .encode_uri(&[tokenless.clone()])
        .unwrap_err();
    assert_eq!(err.code(), InviteErrorCode::Unsupported);
    assert!(Codec::new(ProtocolRevision::V3).encode_uri(&[tokenless]).is_ok());

    let promise = Command::PromiseFollow(PromiseCommand::new(IssuerKind::Account, "ALICE", "T"));
    assert!(matches!(
        Codec::new(ProtocolRevision::V2).encode_uri(&[promise]),
        Err(InviteError::Unsupported(_))
    ));

    let foreign = Command::Join(
        JoinAddress::new(HostFormat::Dns, "example.com", 8008, "KEY").with_token("A:B"),
    );
    assert!(Codec::new(ProtocolRevision::V3).encode_uri(&[foreign]).is_err());
}

#[test]
fn test_encode_rejects_pieces_that_cannot_round_trip() {
    let codec = Codec::default();
    let unwritable = [
        Command::Follow { id: String::new() },
        Command::Follow { id: "AL/ICE".into() },
        Command::TunnelConnect(TunnelAddress::new("HUB", "")),
        Command::TunnelConnect(TunnelAddress::new("H?UB", "ME")),
        Command::PromiseFollow(PromiseCommand::new(IssuerKind::Account, "ALICE", "")),
        Command::PromiseFollow(PromiseCommand::new(IssuerKind::Account, "ALICE", "T/K")),
        Command::PromiseAccountAdd(PromiseCommand::new(IssuerKind::Account, "", "T")),
        Command::PromiseAccountAdd(PromiseCommand::new(IssuerKind::Account, "A#B", "T")),
        Command::Join(JoinAddress::new(HostFormat::Dns, "localhost", 8008, "KEY")),
        Command::Join(JoinAddress::new(HostFormat::Ip4, "example.com", 8008, "KEY")),
        Command::Join(JoinAddress::new(HostFormat::Dns, "example.com", 8008, "")),
        Command::Join(
            JoinAddress::new(HostFormat::Dns, "example.com", 8008, "KEY").with_token("TO/KEN"),
        ),
    ];
    for command in unwritable {
        assert!(
            matches!(
                codec.encode_uri(&[command.clone()]),
                Err(InviteError::Unsupported(_))
            ),
            "encoded {:?}",
            command
        );
    }

    let flat = Codec::new(ProtocolRevision::V1);
    let join = JoinAddress::new(HostFormat::Dns, "example.com", 8008, "KEY").with_token("TO/KEN");
    assert!(matches!(
        flat.encode_join(&join),
        Err(InviteError::Unsupported(_))
    ));
    let join = JoinAddress::new(HostFormat::Dns, "localhost", 8008, "KEY").with_token("TOKEN");
    let uri = flat.encode_uri(&[Command::Join(join.clone())]).unwrap();
    assert_eq!(flat.parse(&uri).unwrap(), vec![Command::Join(join)]);
}

#[test]
fn test_unknown_command_from_config() {
    let uri = "ppppp://invite/join/dns/example.com/tcp/8080/shse/KEY/teleport/follow/ALICE";

    let strict = Codec::from_config(&InviteConfig::default());
    assert!(matches!(
        strict.parse(uri),
        Err(InviteError::UnknownCommand { ref command, .. }) if command == "teleport"
    ));

    let config = InviteConfig::default().with_unknown_commands(UnknownCommandPolicy::Skip);
    let lenient = Codec::from_config(&config);
    let commands = lenient.parse(uri).unwrap();
    let labels: Vec<&str> = commands.iter().map(Command::label).collect();
    assert_eq!(labels, vec!["join", "follow"]);
}

#[test]
fn test_first_failure_aborts_without_partial_result() {
    let uri = "ppppp://invite/follow/ALICE/join/dns/localhost/tcp/8080/shse/KEY/follow/BOB";
    assert!(parse_uri(uri).is_err());
}

#[test]
fn test_trailing_slash_is_ignored() {
    let with = parse_uri("ppppp://invite/follow/ALICE/").unwrap();
    let without = parse_uri("ppppp://invite/follow/ALICE").unwrap();
    assert_eq!(with, without);
}

#[test]
fn test_display_url_round_trip() {
    let uri = "ppppp://invite/join/dns/example.com/tcp/8080/shse/KEY.TOKEN/follow/ALICE";
    let codec = Codec::default();
    let commands = codec.parse(uri).unwrap();
    let url = codec.display_url_for(&commands, uri).unwrap();

    assert!(url.starts_with("https://example.com/invite#ppppp%3A%2F%2F"));
    assert_eq!(uri_from_display_url(&url).unwrap(), uri);
    assert_eq!(codec.parse(&uri_from_display_url(&url).unwrap()).unwrap(), commands);
}

#[test]
fn test_commands_serialize_with_type_tag() {
    let commands = parse_uri("ppppp://invite/follow/ALICE/tunnel-connect/HUB/ME").unwrap();
    let json = serde_json::to_value(&commands).unwrap();
    assert_eq!(json[0]["type"], "follow");
    assert_eq!(json[0]["id"], "ALICE");
    assert_eq!(json[1]["type"], "tunnel-connect");
    assert_eq!(json[1]["hub_pubkey"], "HUB");
}
