use crate::error::Result;
use crate::link::LinkDocument;
use crate::recorder::{Recorder, RecorderConfig};
use crate::signing::test_utils::generate_temp_key_file;
use crate::tests::common::{OneShotServer, write_file};
use crate::transport::SubmitOutcome;
use crate::transport::grafeas::Occurrence;
use tempfile::tempdir;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

#[test]
fn test_modified_file_changes_digest() -> Result<()> {
    let dir = tempdir()?;
    let links = tempdir()?;
    write_file(dir.path(), "a.txt", b"hello")?;

    let mut recorder = Recorder::new(RecorderConfig {
        step_name: "edit".to_string(),
        dump_dir: Some(links.path().to_path_buf()),
        ..Default::default()
    })?;
    recorder.prebuild(dir.path())?;
    write_file(dir.path(), "a.txt", b"world")?;
    let outcome = recorder.perform()?;

    let link = outcome.document.signed();
    assert_eq!(link.materials()["a.txt"]["sha256"], HELLO_SHA256);
    assert_ne!(
        link.materials()["a.txt"]["sha256"],
        link.products()["a.txt"]["sha256"]
    );

    let loaded = LinkDocument::load(&outcome.local_path)?;
    assert_eq!(loaded.signed().materials(), link.materials());
    assert_eq!(loaded.signed().products(), link.products());

    Ok(())
}

#[test]
fn test_unchanged_tree_records_equal_sets() -> Result<()> {
    let dir = tempdir()?;
    let links = tempdir()?;
    write_file(dir.path(), "src/lib.rs", b"pub fn f() {}")?;
    write_file(dir.path(), "README", b"docs")?;

    let mut recorder = Recorder::new(RecorderConfig {
        dump_dir: Some(links.path().to_path_buf()),
        ..Default::default()
    })?;
    recorder.prebuild(dir.path())?;
    let outcome = recorder.perform()?;

    let link = outcome.document.signed();
    assert_eq!(link.name(), "step");
    assert_eq!(link.materials(), link.products());
    assert_eq!(link.materials().len(), 2);

    Ok(())
}

#[test]
fn test_signed_link_posted_to_generic_store() -> Result<()> {
    let (key_path, _key_dir) = generate_temp_key_file()?;
    let dir = tempdir()?;
    let links = tempdir()?;
    write_file(dir.path(), "a.txt", b"hello")?;
    let server = OneShotServer::start(201, "created")?;

    let mut recorder = Recorder::new(RecorderConfig {
        key_path: Some(key_path),
        step_name: "build".to_string(),
        transport: Some(server.url("/api/links")),
        dump_dir: Some(links.path().to_path_buf()),
        ..Default::default()
    })?;
    recorder.prebuild(dir.path())?;
    let outcome = recorder.perform()?;

    let request = server.request()?;
    let posted = LinkDocument::from_json(&request.body)?;
    assert_eq!(posted, outcome.document);
    assert!(posted.is_signed());
    assert_eq!(LinkDocument::load(&outcome.local_path)?, posted);

    let Some(Ok(SubmitOutcome::Posted { status, body, .. })) = outcome.submission else {
        panic!("expected a remote submission");
    };
    assert_eq!(status, 201);
    assert_eq!(body, "created");

    Ok(())
}

#[test]
fn test_unsigned_link_filed_as_occurrence() -> Result<()> {
    let dir = tempdir()?;
    let links = tempdir()?;
    write_file(dir.path(), "a.txt", b"hello")?;
    let server = OneShotServer::start(200, "{}")?;

    let mut recorder = Recorder::new(RecorderConfig {
        step_name: "build".to_string(),
        transport: Some(format!(
            "grafeas+{}?noteName=projects/p/notes/n&resourceUri=git://repo",
            server.url("/v1beta1/projects/p/occurrences")
        )),
        dump_dir: Some(links.path().to_path_buf()),
        ..Default::default()
    })?;
    recorder.prebuild(dir.path())?;
    write_file(dir.path(), "a.txt", b"world")?;
    let outcome = recorder.perform()?;

    assert!(matches!(outcome.submission, Some(Ok(SubmitOutcome::Posted { .. }))));
    let request = server.request()?;
    assert_eq!(request.path, "/v1beta1/projects/p/occurrences");

    let occurrence: Occurrence = serde_json::from_str(&request.body)?;
    assert_eq!(occurrence.kind, "INTOTO");
    assert_eq!(occurrence.resource.uri, "git://repo");
    assert!(occurrence.intoto.signatures.is_empty());
    assert_eq!(
        occurrence.intoto.signed.materials[0].resource_uri,
        format!("file://sha256:{HELLO_SHA256}:a.txt")
    );
    assert_ne!(
        occurrence.intoto.signed.products[0].resource_uri,
        occurrence.intoto.signed.materials[0].resource_uri
    );

    Ok(())
}
