//! Tests for StackService: package, deploy, describe, validate, delete, create-bucket.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use lambdeploy::application::services::StackService;
use lambdeploy::application::ApplicationError;
use lambdeploy::config::Settings;
use lambdeploy::domain::{DeploymentConfig, ProjectPaths};
use lambdeploy::infrastructure::traits::RealFileSystem;
use lambdeploy::util::testing::{self, failed_output, ok_output, FakeCommandRunner};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

const DESCRIBE_JSON: &str = r#"{
    "Stacks": [
        {
            "StackName": "shop-api",
            "StackStatus": "CREATE_COMPLETE",
            "Outputs": [
                {
                    "OutputKey": "ApiEndpoint",
                    "OutputValue": "https://abc123.execute-api.eu-west-1.amazonaws.com/Prod/",
                    "Description": "API Gateway endpoint URL"
                },
                {
                    "OutputKey": "FunctionArn",
                    "OutputValue": "arn:aws:lambda:eu-west-1:123456789012:function:shop-api"
                }
            ]
        }
    ]
}"#;

const MISSING_STACK: &str =
    "An error occurred (ValidationError) when calling the DescribeStacks operation: Stack with id shop-api does not exist";

fn config() -> DeploymentConfig {
    DeploymentConfig {
        bucket_name: Some("shop-artifacts".into()),
        region_name: Some("eu-west-1".into()),
        ..DeploymentConfig::new("shop-api")
    }
}

fn service(temp: &TempDir, runner: Arc<FakeCommandRunner>) -> (StackService, ProjectPaths) {
    service_with(temp, runner, Settings::default())
}

fn service_with(
    temp: &TempDir,
    runner: Arc<FakeCommandRunner>,
    settings: Settings,
) -> (StackService, ProjectPaths) {
    let paths = ProjectPaths::new(temp.path());
    let service = StackService::new(
        Arc::new(RealFileSystem),
        runner,
        Arc::new(settings),
        paths.clone(),
    );
    (service, paths)
}

fn stage_build(paths: &ProjectPaths) {
    fs::create_dir_all(paths.build_dir()).unwrap();
    fs::write(paths.build_dir().join("asgi.py"), "handler = None\n").unwrap();
    fs::write(paths.build_marker(), "").unwrap();
}

fn stage_packaged(paths: &ProjectPaths) {
    fs::create_dir_all(paths.state_dir()).unwrap();
    fs::write(paths.packaged_template_file(), "Resources: {}\n").unwrap();
}

// ============================================================
// package() tests
// ============================================================

#[test]
fn given_no_build_when_package_then_missing_artifact_and_no_provider_call() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new());
    let (service, _) = service(&temp, runner.clone());

    // Act
    let result = service.package(&config());

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::MissingArtifact { .. })
    ));
    assert!(runner.invocations().is_empty());
}

#[test]
fn given_build_when_package_then_writes_template_and_calls_provider() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new());
    let (service, paths) = service(&temp, runner.clone());
    stage_build(&paths);

    // Act
    service.package(&config()).unwrap();

    // Assert
    let template: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(paths.template_file()).unwrap()).unwrap();
    assert_eq!(template["Transform"], "AWS::Serverless-2016-10-31");
    assert_eq!(
        template["Resources"]["ShopApiFunction"]["Properties"]["CodeUri"],
        paths.build_dir().to_string_lossy().into_owned()
    );

    let calls = runner.invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "aws");
    let template_file = paths.template_file().to_string_lossy().into_owned();
    let packaged_file = paths.packaged_template_file().to_string_lossy().into_owned();
    assert!(calls[0].has_args(&["cloudformation", "package"]));
    assert!(calls[0].has_args(&["--template-file", &template_file]));
    assert!(calls[0].has_args(&["--s3-bucket", "shop-artifacts"]));
    assert!(calls[0].has_args(&["--output-template-file", &packaged_file]));
    assert!(calls[0].has_args(&["--region", "eu-west-1"]));
}

#[test]
fn given_provider_rejects_bucket_when_package_then_package_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new().respond(
        &["package"],
        failed_output(255, "The specified bucket does not exist"),
    ));
    let (service, paths) = service(&temp, runner);
    stage_build(&paths);

    // Act
    let result = service.package(&config());

    // Assert
    match result {
        Err(ApplicationError::Package { message }) => {
            assert!(message.contains("bucket does not exist"));
        }
        other => panic!("expected Package error, got {other:?}"),
    }
}

#[test]
fn given_staging_dir_from_failed_build_when_package_then_missing_artifact() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new());
    let (service, paths) = service(&temp, runner.clone());
    fs::create_dir_all(paths.build_dir()).unwrap();
    fs::write(paths.build_dir().join("asgi.py"), "handler = None\n").unwrap();

    // Act
    let result = service.package(&config());

    // Assert
    match result {
        Err(ApplicationError::MissingArtifact { hint, .. }) => {
            assert_eq!(hint, "lambdeploy build");
        }
        other => panic!("expected MissingArtifact, got {other:?}"),
    }
    assert!(runner.invocations().is_empty());
}

#[test]
fn given_stale_packaged_template_when_package_fails_then_deploy_refuses() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new().respond(
        &["package"],
        failed_output(255, "NoSuchBucket: The specified bucket does not exist"),
    ));
    let (service, paths) = service(&temp, runner.clone());
    stage_build(&paths);
    stage_packaged(&paths);

    // Act
    let packaged = service.package(&config());
    let deployed = service.deploy(&config());

    // Assert
    assert!(matches!(packaged, Err(ApplicationError::Package { .. })));
    assert!(!paths.packaged_template_file().exists());
    assert!(matches!(
        deployed,
        Err(ApplicationError::MissingArtifact { .. })
    ));
    assert!(runner.calls_with(&["cloudformation", "deploy"]).is_empty());
}

// ============================================================
// deploy() tests
// ============================================================

#[test]
fn given_no_packaged_template_when_deploy_then_missing_artifact_and_no_provider_call() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new());
    let (service, _) = service(&temp, runner.clone());

    // Act
    let result = service.deploy(&config());

    // Assert
    match result {
        Err(ApplicationError::MissingArtifact { hint, .. }) => {
            assert_eq!(hint, "lambdeploy package");
        }
        other => panic!("expected MissingArtifact, got {other:?}"),
    }
    assert!(runner.invocations().is_empty());
}

#[test]
fn given_packaged_template_when_deploy_then_deploys_and_describes() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(
        FakeCommandRunner::new().respond(&["describe-stacks"], ok_output(DESCRIBE_JSON)),
    );
    let (service, paths) = service(&temp, runner.clone());
    stage_packaged(&paths);

    // Act
    let stack = service.deploy(&config()).unwrap();

    // Assert
    assert_eq!(stack.name, "shop-api");
    assert_eq!(stack.endpoints().len(), 1);

    let calls = runner.invocations();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].has_args(&["cloudformation", "deploy"]));
    assert!(calls[0].has_args(&["--stack-name", "shop-api"]));
    assert!(calls[0].has_args(&["--no-fail-on-empty-changeset"]));
    assert!(calls[0].has_args(&["--capabilities", "CAPABILITY_IAM", "CAPABILITY_AUTO_EXPAND"]));
    assert!(calls[1].has_args(&["describe-stacks"]));
}

#[test]
fn given_provider_failure_when_deploy_then_deploy_error_with_stderr() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new().respond(
        &["deploy"],
        failed_output(255, "Waiter StackCreateComplete failed"),
    ));
    let (service, paths) = service(&temp, runner.clone());
    stage_packaged(&paths);

    // Act
    let result = service.deploy(&config());

    // Assert
    match result {
        Err(ApplicationError::Deploy { message }) => assert!(message.contains("Waiter")),
        other => panic!("expected Deploy error, got {other:?}"),
    }
    assert!(runner.calls_with(&["describe-stacks"]).is_empty());
}

// ============================================================
// describe() tests
// ============================================================

#[test]
fn given_deployed_stack_when_describe_then_parses_outputs() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(
        FakeCommandRunner::new().respond(&["describe-stacks"], ok_output(DESCRIBE_JSON)),
    );
    let (service, _) = service(&temp, runner);

    // Act
    let stack = service.describe(&config()).unwrap();

    // Assert
    assert_eq!(stack.status, "CREATE_COMPLETE");
    assert_eq!(stack.outputs.len(), 2);
    assert_eq!(stack.outputs[0].key, "ApiEndpoint");
    assert_eq!(
        stack.outputs[0].description.as_deref(),
        Some("API Gateway endpoint URL")
    );
    assert!(stack.outputs[1].description.is_none());
    let endpoints = stack.endpoints();
    assert_eq!(endpoints.len(), 1);
    assert!(endpoints[0].value.starts_with("https://abc123"));
}

#[test]
fn given_unknown_stack_when_describe_then_not_deployed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(
        FakeCommandRunner::new().respond(&["describe-stacks"], failed_output(255, MISSING_STACK)),
    );
    let (service, _) = service(&temp, runner);

    // Act
    let result = service.describe(&config());

    // Assert
    assert!(matches!(result, Err(ApplicationError::NotDeployed(ref name)) if name == "shop-api"));
}

#[test]
fn given_profile_setting_when_describe_then_passes_profile() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(
        FakeCommandRunner::new().respond(&["describe-stacks"], ok_output(DESCRIBE_JSON)),
    );
    let settings = Settings {
        aws_cli: "/opt/aws/bin/aws".into(),
        profile: Some("staging".into()),
        ..Settings::default()
    };
    let (service, _) = service_with(&temp, runner.clone(), settings);

    // Act
    service.describe(&config()).unwrap();

    // Assert
    let calls = runner.invocations();
    assert_eq!(calls[0].program, "/opt/aws/bin/aws");
    assert!(calls[0].has_args(&["--profile", "staging"]));
}

// ============================================================
// validate() tests
// ============================================================

#[test]
fn given_valid_template_when_validate_then_reports_capabilities() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new().respond(
        &["validate-template"],
        ok_output(
            r#"{"Parameters": [], "Description": "shop-api", "Capabilities": ["CAPABILITY_IAM"], "CapabilitiesReason": "The following resource(s) require capabilities: [AWS::IAM::Role]"}"#,
        ),
    ));
    let (service, paths) = service(&temp, runner.clone());
    stage_packaged(&paths);

    // Act
    let validation = service.validate(&config()).unwrap();

    // Assert
    assert_eq!(validation.description.as_deref(), Some("shop-api"));
    assert_eq!(validation.capabilities, vec!["CAPABILITY_IAM".to_string()]);
    assert!(validation.capabilities_reason.is_some());
    let body = format!("file://{}", paths.packaged_template_file().display());
    assert!(runner.invocations()[0].has_args(&["--template-body", &body]));
}

#[test]
fn given_rejected_template_when_validate_then_invalid_template() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new().respond(
        &["validate-template"],
        failed_output(255, "Template format error: unsupported structure."),
    ));
    let (service, paths) = service(&temp, runner);
    stage_packaged(&paths);

    // Act
    let result = service.validate(&config());

    // Assert
    assert!(matches!(result, Err(ApplicationError::InvalidTemplate { .. })));
}

// ============================================================
// delete() tests
// ============================================================

#[test]
fn given_deployed_stack_when_delete_then_requests_deletion() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(
        FakeCommandRunner::new().respond(&["describe-stacks"], ok_output(DESCRIBE_JSON)),
    );
    let (service, _) = service(&temp, runner.clone());

    // Act
    let stack = service.delete(&config()).unwrap();

    // Assert
    assert_eq!(stack.name, "shop-api");
    let deletes = runner.calls_with(&["delete-stack"]);
    assert_eq!(deletes.len(), 1);
    assert!(deletes[0].has_args(&["--stack-name", "shop-api"]));
}

#[test]
fn given_unknown_stack_when_delete_then_not_deployed_and_no_deletion() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(
        FakeCommandRunner::new().respond(&["describe-stacks"], failed_output(255, MISSING_STACK)),
    );
    let (service, _) = service(&temp, runner.clone());

    // Act
    let result = service.delete(&config());

    // Assert
    assert!(matches!(result, Err(ApplicationError::NotDeployed(_))));
    assert!(runner.calls_with(&["delete-stack"]).is_empty());
}

// ============================================================
// create_bucket() tests
// ============================================================

#[test]
fn given_explicit_bucket_outside_default_region_when_create_then_sets_location() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new());
    let (service, _) = service(&temp, runner.clone());

    // Act
    let created = service
        .create_bucket(None, Some("my-bucket".into()), Some("eu-central-1".into()))
        .unwrap();

    // Assert
    assert_eq!(created.bucket_name, "my-bucket");
    assert_eq!(created.region_name, "eu-central-1");
    let calls = runner.invocations();
    assert!(calls[0].has_args(&["s3api", "create-bucket", "--bucket", "my-bucket"]));
    assert!(calls[0].has_args(&[
        "--create-bucket-configuration",
        "LocationConstraint=eu-central-1"
    ]));
}

#[test]
fn given_config_when_create_bucket_then_uses_configured_bucket_and_region() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new());
    let (service, _) = service(&temp, runner);

    // Act
    let created = service.create_bucket(Some(&config()), None, None).unwrap();

    // Assert
    assert_eq!(created.bucket_name, "shop-artifacts");
    assert_eq!(created.region_name, "eu-west-1");
}

#[test]
fn given_nothing_when_create_bucket_then_generates_name_in_default_region() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new());
    let (service, _) = service(&temp, runner.clone());

    // Act
    let created = service.create_bucket(None, None, None).unwrap();

    // Assert
    assert!(created.bucket_name.starts_with("lambdeploy-"));
    assert_eq!(created.region_name, "us-east-1");
    assert!(runner.calls_with(&["--create-bucket-configuration"]).is_empty());
}

#[test]
fn given_provider_failure_when_create_bucket_then_provider_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(FakeCommandRunner::new().respond(
        &["create-bucket"],
        failed_output(254, "BucketAlreadyExists"),
    ));
    let (service, _) = service(&temp, runner);

    // Act
    let result = service.create_bucket(None, Some("taken".into()), None);

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Provider { ref operation, .. }) if operation == "create-bucket"
    ));
}
