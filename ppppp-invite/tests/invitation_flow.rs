//! End-to-end invitation building against mock collaborators.

use ppppp_invite::test_utils::{MockEnvironment, MockHubDirectory, MockPromiseService, TestFixtures};
use ppppp_invite::{
    display_url, parse_uri, Codec, Command, HubStage, InvitationBuilder, InviteConfig, InviteError,
    InviteErrorCode, InviteOptions, PromiseSpec, ProtocolRevision, UrlScheme,
};

fn builder(env: &MockEnvironment, config: InviteConfig) -> InvitationBuilder {
    InvitationBuilder::new(env.collaborators(), config).unwrap()
}

#[tokio::test]
async fn test_friend_invite_flat_revision() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_MULTISERVER]);
    env.network
        .add_hub(TestFixtures::HUB_MULTISERVER, TestFixtures::TOKEN);
    let builder = builder(&env, InviteConfig::new(ProtocolRevision::V1));

    let invitation = builder
        .create_for_friend(&InviteOptions::new("ALICE"))
        .await
        .unwrap();

    assert_eq!(
        invitation.uri,
        "ppppp://invite/join/example.com/8008/HUB_PUBKEY/MOCK_TOKEN/follow/ALICE/promise.follow/identity.ALICE/MOCK_PROMISE"
    );
    assert_eq!(env.promise.requests(), vec![PromiseSpec::follow("ALICE")]);
}

#[tokio::test]
async fn test_friend_invite_display_url() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_MULTISERVER]);
    env.network
        .add_hub(TestFixtures::HUB_MULTISERVER, TestFixtures::TOKEN);
    let builder = builder(&env, InviteConfig::new(ProtocolRevision::V1));

    let invitation = builder
        .create_for_friend(&InviteOptions::new(TestFixtures::FRIEND_ID))
        .await
        .unwrap();

    assert_eq!(
        invitation.url,
        "http://example.com/invite#ppppp%3A%2F%2Finvite%2Fjoin%2Fexample.com%2F8008%2FHUB_PUBKEY%2FMOCK_TOKEN%2Ffollow%2FMOCK_ID%2Fpromise.follow%2Fidentity.MOCK_ID%2FMOCK_PROMISE"
    );
}

#[tokio::test]
async fn test_self_invite_multiaddr_revision() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_MULTIADDR]);
    env.network.add_hub(TestFixtures::HUB_MULTIADDR, "TOKEN");
    let builder = builder(&env, InviteConfig::default());

    let invitation = builder
        .create_for_myself(&InviteOptions::new(TestFixtures::ACCOUNT_ID))
        .await
        .unwrap();

    assert_eq!(
        invitation.uri,
        "ppppp://invite/join/dns/example.com/tcp/8080/shse/PUBKEY.TOKEN/tunnel-connect/PUBKEY/SELF_PUBKEY/promise.account-add/account.ACCOUNT_ID/MOCK_PROMISE"
    );
    assert_eq!(
        invitation.url,
        display_url(UrlScheme::Https, "example.com", &invitation.uri)
    );
    assert_eq!(
        env.promise.requests(),
        vec![PromiseSpec::account_add(TestFixtures::ACCOUNT_ID)]
    );

    // The produced URI parses back into the commands it was built from.
    let commands = parse_uri(&invitation.uri).unwrap();
    assert_eq!(commands.len(), 3);
    assert!(matches!(&commands[1], Command::TunnelConnect(tunnel)
        if tunnel.hub_pubkey == "PUBKEY" && tunnel.target_pubkey == TestFixtures::SELF_PUBKEY));
}

#[tokio::test]
async fn test_explicit_hub_address_skips_directory() {
    let env = MockEnvironment::new(&[]);
    env.network.add_hub(TestFixtures::HUB_MULTIADDR, "TOKEN");
    let builder = builder(&env, InviteConfig::default());

    let invitation = builder
        .create_for_friend(
            &InviteOptions::new("ALICE").with_hub_address(TestFixtures::HUB_MULTIADDR),
        )
        .await
        .unwrap();

    assert!(env.directory.requests().is_empty());
    assert!(invitation
        .uri
        .starts_with("ppppp://invite/join/dns/example.com/tcp/8080/shse/PUBKEY.TOKEN/follow/ALICE"));
}

#[tokio::test]
async fn test_failed_hub_is_dropped_and_order_kept() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_A, TestFixtures::HUB_B, TestFixtures::HUB_C]);
    env.network.add_hub(TestFixtures::HUB_A, "TA");
    env.network.add_unreachable_hub(TestFixtures::HUB_B);
    env.network.add_hub(TestFixtures::HUB_C, "TC");
    let builder = builder(&env, InviteConfig::default());

    let invitation = builder
        .create_for_myself(&InviteOptions::new(TestFixtures::ACCOUNT_ID).with_hubs(3))
        .await
        .unwrap();

    assert_eq!(
        invitation.uri,
        "ppppp://invite\
         /join/dns/hub-a.example.com/tcp/8008/shse/HUB_A_PUBKEY.TA\
         /join/ip4/10.0.0.3/tcp/8008/shse/HUB_C_PUBKEY.TC\
         /tunnel-connect/HUB_A_PUBKEY/SELF_PUBKEY\
         /promise.account-add/account.ACCOUNT_ID/MOCK_PROMISE"
    );
    assert!(invitation.url.starts_with("https://hub-a.example.com/invite#"));
    assert_eq!(env.directory.requests(), vec![3]);
    assert_eq!(env.network.connect_log().len(), 3);
}

#[tokio::test]
async fn test_concurrent_negotiation_matches_sequential() {
    let hubs = [TestFixtures::HUB_A, TestFixtures::HUB_B, TestFixtures::HUB_C];
    let options = InviteOptions::new("ALICE").with_hubs(3);

    let mut uris = Vec::new();
    for concurrent in [false, true] {
        let env = MockEnvironment::new(&hubs);
        env.network.add_hub(TestFixtures::HUB_A, "TA");
        env.network.add_tokenless_hub(TestFixtures::HUB_B);
        env.network.add_hub(TestFixtures::HUB_C, "TC");
        let config = InviteConfig::default().with_concurrent_negotiation(concurrent);
        let invitation = builder(&env, config)
            .create_for_friend(&options)
            .await
            .unwrap();
        uris.push(invitation.uri);
    }

    assert_eq!(uris[0], uris[1]);
    assert!(uris[0].contains("HUB_A_PUBKEY.TA/join/ip4/10.0.0.3"));
}

#[tokio::test]
async fn test_all_hubs_failed_reports_every_cause() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_A, TestFixtures::HUB_B, TestFixtures::HUB_C]);
    env.network.add_unreachable_hub(TestFixtures::HUB_A);
    env.network.add_tokenless_hub(TestFixtures::HUB_B);
    // HUB_C is never registered, so connecting to it fails too.
    let builder = builder(&env, InviteConfig::default());

    let err = builder
        .create_for_friend(&InviteOptions::new("ALICE").with_hubs(3))
        .await
        .unwrap_err();

    assert_eq!(err.code(), InviteErrorCode::AllHubsFailed);
    assert!(err.is_retryable());
    let failures = err.hub_failures().unwrap();
    assert_eq!(failures.len(), 3);
    let summary: Vec<(&str, HubStage)> = failures
        .iter()
        .map(|failure| (failure.address.as_str(), failure.stage))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TestFixtures::HUB_A, HubStage::Connect),
            (TestFixtures::HUB_B, HubStage::CreateToken),
            (TestFixtures::HUB_C, HubStage::Connect),
        ]
    );
    assert!(env.promise.requests().is_empty());
}

#[tokio::test]
async fn test_unparseable_hub_address_is_a_hub_failure() {
    let env = MockEnvironment::new(&[]);
    env.network.add_hub("ws://example.com", "TOKEN");
    let builder = builder(&env, InviteConfig::default());

    let err = builder
        .create_for_friend(&InviteOptions::new("ALICE").with_hub_address("ws://example.com"))
        .await
        .unwrap_err();

    let failures = err.hub_failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures.iter().next().unwrap().stage, HubStage::Address);
}

#[tokio::test]
async fn test_dotless_multiserver_host_is_a_hub_failure() {
    let localhost = "net:localhost:8008~shse:HUB_PUBKEY";
    let env = MockEnvironment::new(&[]);
    env.network.add_hub(localhost, "TOKEN");
    let options = InviteOptions::new("ALICE").with_hub_address(localhost);

    let err = builder(&env, InviteConfig::default())
        .create_for_friend(&options)
        .await
        .unwrap_err();
    let failures = err.hub_failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures.iter().next().unwrap().stage, HubStage::Address);
    assert!(env.promise.requests().is_empty());

    // The flat grammar carries no host format, so the same hub is usable there.
    let invitation = builder(&env, InviteConfig::new(ProtocolRevision::V1))
        .create_for_friend(&options)
        .await
        .unwrap();
    let codec = Codec::new(ProtocolRevision::V1);
    assert_eq!(codec.parse(&invitation.uri).unwrap().len(), 3);
}

#[tokio::test]
async fn test_unencodable_token_only_drops_its_hub() {
    for token in ["T:A", "TO/KEN", "TO#KEN"] {
        let env = MockEnvironment::new(&[TestFixtures::HUB_A, TestFixtures::HUB_C]);
        env.network.add_hub(TestFixtures::HUB_A, token);
        env.network.add_hub(TestFixtures::HUB_C, "TC");

        let invitation = builder(&env, InviteConfig::default())
            .create_for_friend(&InviteOptions::new("ALICE").with_hubs(2))
            .await
            .unwrap();

        assert_eq!(
            invitation.uri,
            "ppppp://invite/join/ip4/10.0.0.3/tcp/8008/shse/HUB_C_PUBKEY.TC/follow/ALICE/promise.follow/account.ALICE/MOCK_PROMISE",
            "token {:?}",
            token
        );
        assert_eq!(parse_uri(&invitation.uri).unwrap().len(), 3);
    }
}

#[tokio::test]
async fn test_unencodable_token_on_every_hub_fails_per_hub() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_A]);
    env.network.add_hub(TestFixtures::HUB_A, "TO/KEN");

    let err = builder(&env, InviteConfig::default())
        .create_for_myself(&InviteOptions::new(TestFixtures::ACCOUNT_ID))
        .await
        .unwrap_err();

    assert_eq!(err.code(), InviteErrorCode::AllHubsFailed);
    let failure = err.hub_failures().unwrap().iter().next().unwrap();
    assert_eq!(failure.address, TestFixtures::HUB_A);
    assert_eq!(failure.stage, HubStage::Address);
}

#[tokio::test]
async fn test_id_with_reserved_characters_is_rejected() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_A]);
    env.network.add_hub(TestFixtures::HUB_A, "TOKEN");
    let builder = builder(&env, InviteConfig::default());

    for id in ["AL/ICE", "ALICE?x", "AL#ICE"] {
        let result = builder.create_for_friend(&InviteOptions::new(id)).await;
        assert!(
            matches!(result, Err(InviteError::Validation(_))),
            "accepted id {:?}",
            id
        );
    }
    assert!(env.network.connect_log().is_empty());
}

#[tokio::test]
async fn test_promise_token_with_reserved_characters_is_rejected() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_A])
        .with_promise_service(MockPromiseService::new("PRO/MISE"));
    env.network.add_hub(TestFixtures::HUB_A, "TOKEN");

    let err = builder(&env, InviteConfig::default())
        .create_for_friend(&InviteOptions::new("ALICE"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), InviteErrorCode::PromiseMinting);
}

#[tokio::test]
async fn test_hub_directory_errors() {
    let env = MockEnvironment::new(&[]);
    let err = builder(&env, InviteConfig::default())
        .create_for_friend(&InviteOptions::new("ALICE"))
        .await
        .unwrap_err();
    assert!(matches!(err, InviteError::NoHubsAvailable));

    let env = MockEnvironment::new(&[]).with_directory(MockHubDirectory::unavailable());
    let err = builder(&env, InviteConfig::default())
        .create_for_friend(&InviteOptions::new("ALICE"))
        .await
        .unwrap_err();
    assert!(matches!(err, InviteError::HubDirectory(_)));
    assert!(env.network.connect_log().is_empty());
}

#[tokio::test]
async fn test_default_hub_count_comes_from_config() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_A, TestFixtures::HUB_B, TestFixtures::HUB_C]);
    env.network.add_hub(TestFixtures::HUB_A, "TA");
    env.network.add_hub(TestFixtures::HUB_B, "TB");
    let config = InviteConfig::default().with_default_hubs(2);

    let invitation = builder(&env, config)
        .create_for_friend(&InviteOptions::new("ALICE"))
        .await
        .unwrap();

    assert_eq!(env.directory.requests(), vec![2]);
    let joins = parse_uri(&invitation.uri)
        .unwrap()
        .into_iter()
        .filter(|command| matches!(command, Command::Join(_)))
        .count();
    assert_eq!(joins, 2);
}

#[tokio::test]
async fn test_promise_failure_is_fatal() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_MULTIADDR])
        .with_promise_service(MockPromiseService::rejecting("account is frozen"));
    env.network.add_hub(TestFixtures::HUB_MULTIADDR, "TOKEN");

    let err = builder(&env, InviteConfig::default())
        .create_for_myself(&InviteOptions::new(TestFixtures::ACCOUNT_ID))
        .await
        .unwrap_err();

    assert!(matches!(err, InviteError::PromiseMinting(_)));
    assert_eq!(err.code(), InviteErrorCode::PromiseMinting);
    assert!(err.to_string().contains("account is frozen"));
}

#[tokio::test]
async fn test_builder_output_matches_codec() {
    let env = MockEnvironment::new(&[TestFixtures::HUB_MULTIADDR]);
    env.network.add_hub(TestFixtures::HUB_MULTIADDR, "TOKEN");

    for revision in ProtocolRevision::ALL {
        let invitation = builder(&env, InviteConfig::new(revision))
            .create_for_friend(&InviteOptions::new("ALICE"))
            .await
            .unwrap();
        let codec = Codec::new(revision);
        let commands = codec.parse(&invitation.uri).unwrap();
        assert_eq!(codec.encode_uri(&commands).unwrap(), invitation.uri);
        assert_eq!(
            codec.display_url_for(&commands, &invitation.uri).unwrap(),
            invitation.url
        );
    }
}
