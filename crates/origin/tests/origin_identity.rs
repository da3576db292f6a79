//! Integration tests for origin ids and cross-process transmission.

use conductor_origin::{CodePointer, EntryPoint, PipelineOrigin, RepositoryOrigin};
use conductor_shared::{ErrorCode, ErrorEnvelope, SnapshotError};
use proptest::prelude::*;
use std::error::Error;

#[derive(Debug, Clone)]
struct OriginParts {
    executable_path: String,
    module: String,
    fn_name: String,
    container_image: Option<String>,
    entry_point: Option<Vec<String>>,
}

impl OriginParts {
    fn build(&self) -> Result<RepositoryOrigin, Box<dyn Error>> {
        let entry_point = self.entry_point.clone().map(EntryPoint::new);
        Ok(RepositoryOrigin::new(
            self.executable_path.clone(),
            CodePointer::module(self.module.clone(), self.fn_name.clone())?,
            self.container_image.clone(),
            entry_point,
        )?)
    }
}

fn arb_parts() -> impl Strategy<Value = OriginParts> {
    (
        "/[a-z]{1,8}/python[0-9]?",
        "[a-z]{1,6}(\\.[a-z]{1,6}){0,2}",
        "[a-z_]{1,10}",
        proptest::option::of("[a-z]{1,6}/[a-z]{1,6}:[0-9]{1,3}"),
        proptest::option::of(proptest::collection::vec("[a-z-]{1,6}", 0..4)),
    )
        .prop_map(
            |(executable_path, module, fn_name, container_image, entry_point)| OriginParts {
                executable_path,
                module,
                fn_name,
                container_image,
                entry_point,
            },
        )
}

fn base() -> Result<RepositoryOrigin, Box<dyn Error>> {
    Ok(RepositoryOrigin::new(
        "/usr/bin/python3",
        CodePointer::file("/code/repo.py", "define_repo", None)?,
        Some("acme/pipelines:1".to_owned()),
        Some(EntryPoint::new(["dagster", "api", "grpc"])),
    )?)
}

#[test]
fn changing_any_field_changes_the_id() -> Result<(), Box<dyn Error>> {
    let origin = base()?;
    let id = origin.id()?;

    let variants = [
        RepositoryOrigin::new(
            "/usr/bin/python3.12",
            origin.code_pointer().clone(),
            origin.container_image().map(str::to_owned),
            origin.entry_point().cloned(),
        )?,
        RepositoryOrigin::new(
            origin.executable_path(),
            CodePointer::file("/code/other.py", "define_repo", None)?,
            origin.container_image().map(str::to_owned),
            origin.entry_point().cloned(),
        )?,
        RepositoryOrigin::new(
            origin.executable_path(),
            origin.code_pointer().clone(),
            None,
            origin.entry_point().cloned(),
        )?,
        RepositoryOrigin::new(
            origin.executable_path(),
            origin.code_pointer().clone(),
            origin.container_image().map(str::to_owned),
            None,
        )?,
    ];
    for variant in &variants {
        assert_ne!(variant.id()?, id, "{variant:?}");
    }
    Ok(())
}

#[test]
fn snapshots_round_trip_to_equal_values() -> Result<(), Box<dyn Error>> {
    let origin = base()?;
    let pipeline = origin.pipeline_origin("nightly_etl")?;

    let restored = PipelineOrigin::from_snapshot(&pipeline.to_snapshot()?)?;
    assert_eq!(restored, pipeline);
    assert_eq!(restored.id()?, pipeline.id()?);
    assert_eq!(
        RepositoryOrigin::from_snapshot(&origin.to_snapshot()?)?,
        origin
    );
    Ok(())
}

#[test]
fn foreign_record_tags_are_rejected() -> Result<(), Box<dyn Error>> {
    let payload = base()?.to_snapshot()?;
    let error = PipelineOrigin::from_snapshot(&payload)
        .err()
        .ok_or("a repository payload must not decode as a pipeline")?;
    assert!(matches!(error, SnapshotError::RecordMismatch { .. }));

    let envelope = ErrorEnvelope::from(error);
    assert_eq!(
        envelope.code,
        ErrorCode::new("snapshot", "record_mismatch")
    );
    Ok(())
}

#[test]
fn received_payloads_are_rechecked() {
    let payload = concat!(
        r#"{"__record__":"PipelineOrigin","pipeline_name":"","#,
        r#""repository_origin":{"code_pointer":{"fn_name":"f","kind":"module","module":"m"},"#,
        r#""container_image":null,"entry_point":null,"executable_path":"python"}}"#
    );
    assert!(matches!(
        PipelineOrigin::from_snapshot(payload),
        Err(SnapshotError::Deserialize { .. })
    ));
}

#[test]
fn payloads_with_empty_image_and_entry_point_reconstruct() -> Result<(), Box<dyn Error>> {
    let payload = concat!(
        r#"{"__record__":"RepositoryOrigin","#,
        r#""code_pointer":{"fn_name":"f","kind":"module","module":"m"},"#,
        r#""container_image":"","entry_point":[],"executable_path":"python"}"#
    );
    let origin = RepositoryOrigin::from_snapshot(payload)?;
    assert_eq!(origin.container_image(), Some(""));
    assert_eq!(origin.entry_point(), Some(&EntryPoint::new(Vec::<String>::new())));
    assert_eq!(origin.to_snapshot()?, payload);
    Ok(())
}

proptest! {
    #[test]
    fn equal_content_gives_equal_ids(parts in arb_parts()) {
        let first = parts.build().map_err(|error| TestCaseError::fail(error.to_string()))?;
        let second = parts.build().map_err(|error| TestCaseError::fail(error.to_string()))?;
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            first.id().map_err(|error| TestCaseError::fail(error.to_string()))?,
            second.id().map_err(|error| TestCaseError::fail(error.to_string()))?
        );
    }

    #[test]
    fn pipeline_origins_share_repository_fields(parts in arb_parts(), name in "[a-z_]{1,12}") {
        let origin = parts.build().map_err(|error| TestCaseError::fail(error.to_string()))?;
        let pipeline = origin
            .pipeline_origin(name.as_str())
            .map_err(|error| TestCaseError::fail(error.to_string()))?;
        prop_assert_eq!(pipeline.repository_origin(), &origin);
        prop_assert_eq!(pipeline.executable_path(), origin.executable_path());
    }
}
