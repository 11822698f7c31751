//! End-to-end tests for the `status` command.

mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_ok() {
    let mut server = mockito::Server::new();
    let probe = server
        .mock("GET", "/api/space")
        .match_header("authorization", "Bearer tok-status")
        .with_status(200)
        .with_body("[]")
        .create();

    let fixture = TestFixture::new().with_context(&server.url(), "tok-status");

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Context:      test"))
        .stdout(predicate::str::contains("Organization: Test Org"))
        .stdout(predicate::str::contains("User:         dev@example.com"))
        .stdout(predicate::str::contains("Auth:         OK"));

    probe.assert();
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_rejected_token() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/api/space").with_status(401).create();

    let fixture = TestFixture::new().with_context(&server.url(), "expired");

    fixture
        .command()
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Auth:         FAILED"))
        .stderr(predicate::str::contains("cub auth login"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_without_context() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read cub config"));
}
