//! Integration tests for `crapdns`.
//!
//! Tests marked `#[ignore]` require root:
//!
//! ```bash
//! sudo cargo test -- --ignored
//! ```

use std::path::Path;
use std::sync::Arc;

use crapdns::server::ANSWER_TTL;
use crapdns::{DomainSet, QueryResponder, ResolverRegistry};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, RecordType};

fn domain_set(list: &str) -> Arc<DomainSet> {
    Arc::new(DomainSet::resolve(Some(list), Path::new("/nonexistent.conf")).unwrap())
}

fn a_query(name: &str) -> Vec<u8> {
    let mut msg = Message::new();
    msg.set_id(1)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(Name::from_utf8(name).unwrap(), RecordType::A));
    msg.to_vec().unwrap()
}

// ---------------------------------------------------------------------------
// Tempdir tests (no root required)
// ---------------------------------------------------------------------------

#[test]
fn full_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ResolverRegistry::with_dir(dir.path());
    let domains = domain_set("app.test,docker.internal");

    // Provision: one marker-tagged file per domain.
    registry.provision(domains.iter()).unwrap();
    for domain in ["app.test", "docker.internal"] {
        let content = std::fs::read_to_string(dir.path().join(domain)).unwrap();
        assert!(content.starts_with("###CRAPDNS###"));
        assert!(content.contains("nameserver 127.0.0.1"));
    }

    // Serve: the same domain set drives the responder.
    let responder = QueryResponder::new(Arc::clone(&domains));
    let reply =
        Message::from_vec(&responder.answer(&a_query("api.app.test.")).unwrap()).unwrap();
    assert!(reply.authoritative());
    assert_eq!(reply.answers().len(), 1);
    assert_eq!(reply.answers()[0].ttl(), ANSWER_TTL);
    assert_eq!(reply.answers()[0].data(), Some(&RData::A(A::new(127, 0, 0, 1))));

    // Cleanup: owned files gone, nothing else existed.
    let outcome = registry.cleanup().unwrap();
    assert_eq!(outcome.removed, 2);
    assert_eq!(outcome.skipped, 0);
    assert!(!dir.path().join("app.test").exists());
}

#[test]
fn cleanup_partitions_owned_from_foreign() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ResolverRegistry::with_dir(dir.path());

    registry.provision(["foo.test"]).unwrap();
    std::fs::write(dir.path().join("bar.test"), "nameserver 1.1.1.1\n").unwrap();

    let outcome = registry.cleanup().unwrap();
    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(!dir.path().join("foo.test").exists());
    assert!(dir.path().join("bar.test").exists());
}

#[test]
fn command_line_domains_override_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("crapdns.conf");
    std::fs::write(&config, "from-config.test\n").unwrap();

    let domains = DomainSet::resolve(Some("a.test,b.test"), &config).unwrap();
    assert_eq!(domains.iter().collect::<Vec<_>>(), vec!["a.test", "b.test"]);

    // Only the command-line domains are provisioned and served.
    let registry = ResolverRegistry::with_dir(dir.path().join("resolver"));
    registry.provision(domains.iter()).unwrap();
    assert!(registry.resolver_dir().join("a.test").exists());
    assert!(registry.resolver_dir().join("b.test").exists());
    assert!(!registry.resolver_dir().join("from-config.test").exists());

    let responder = QueryResponder::new(Arc::new(domains));
    let reply =
        Message::from_vec(&responder.answer(&a_query("from-config.test.")).unwrap()).unwrap();
    assert_eq!(reply.response_code(), ResponseCode::NXDomain);
}

#[test]
fn spec_scenario_example_test() {
    let responder = QueryResponder::new(domain_set("example.test"));

    // A? foo.example.test -> authoritative 127.0.0.1, TTL 120.
    let reply =
        Message::from_vec(&responder.answer(&a_query("foo.example.test.")).unwrap()).unwrap();
    assert!(reply.authoritative());
    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert_eq!(reply.answers().len(), 1);
    assert_eq!(reply.answers()[0].ttl(), 120);
    assert_eq!(reply.answers()[0].data(), Some(&RData::A(A::new(127, 0, 0, 1))));

    // A? other.test -> NXDOMAIN, no answers.
    let reply = Message::from_vec(&responder.answer(&a_query("other.test.")).unwrap()).unwrap();
    assert_eq!(reply.response_code(), ResponseCode::NXDomain);
    assert!(reply.answers().is_empty());

    // AAAA? example.test -> NXDOMAIN.
    let mut msg = Message::new();
    msg.set_id(2)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .add_query(Query::query(
            Name::from_utf8("example.test.").unwrap(),
            RecordType::AAAA,
        ));
    let reply =
        Message::from_vec(&responder.answer(&msg.to_vec().unwrap()).unwrap()).unwrap();
    assert_eq!(reply.response_code(), ResponseCode::NXDomain);
}

#[test]
fn provision_cleanup_repeated_pair_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ResolverRegistry::with_dir(dir.path());
    std::fs::write(dir.path().join("foreign.test"), "nameserver 8.8.8.8\n").unwrap();

    let snapshot = |outcome: crapdns::CleanupOutcome| (outcome.removed, outcome.skipped);

    registry.provision(["mine.test"]).unwrap();
    let first = snapshot(registry.cleanup().unwrap());

    registry.provision(["mine.test"]).unwrap();
    let second = snapshot(registry.cleanup().unwrap());

    assert_eq!(first, second);
    assert!(dir.path().join("foreign.test").exists());
    assert!(!dir.path().join("mine.test").exists());
}

// ---------------------------------------------------------------------------
// Root-only tests
// ---------------------------------------------------------------------------

#[test]
#[ignore = "requires root to write /etc/resolver/"]
fn real_provision_and_cleanup() {
    let registry = ResolverRegistry::new();
    registry.provision(["crapdns-selftest.test"]).unwrap();
    assert!(Path::new("/etc/resolver/crapdns-selftest.test").exists());

    registry.cleanup().unwrap();
    assert!(!Path::new("/etc/resolver/crapdns-selftest.test").exists());
}
