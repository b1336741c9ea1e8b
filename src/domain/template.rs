//! Infrastructure template rendering
//!
//! Produces the serverless (SAM) template for a deployment: one function
//! fronted by a proxy API with a root and a greedy route. The provider's
//! templating engine owns the semantics; this only fills in the document.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::domain::DeploymentConfig;

pub const S3_POLICY: &str = "AmazonS3FullAccess";
pub const DYNAMODB_POLICY: &str = "AmazonDynamoDBFullAccess";
/// Output key holding the public API URL.
pub const API_ENDPOINT_OUTPUT: &str = "ApiEndpoint";

/// Render the template for `config`, with `code_uri` as the function code location.
pub fn render_template(config: &DeploymentConfig, code_uri: &Path) -> Value {
    let function_id = config.function_logical_id();

    let mut properties = Map::new();
    properties.insert(
        "CodeUri".into(),
        Value::String(code_uri.to_string_lossy().into_owned()),
    );
    properties.insert("Handler".into(), Value::String(config.handler.clone()));
    properties.insert("Runtime".into(), Value::String(config.runtime().to_string()));
    properties.insert("Timeout".into(), json!(config.timeout));

    let policies = policies(config);
    if !policies.is_empty() {
        properties.insert("Policies".into(), json!(policies));
    }

    properties.insert(
        "Events".into(),
        json!({
            "ProxyApiRoot": {
                "Type": "Api",
                "Properties": { "Path": "/", "Method": "ANY" }
            },
            "ProxyApiGreedy": {
                "Type": "Api",
                "Properties": { "Path": "/{proxy+}", "Method": "ANY" }
            }
        }),
    );

    json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Transform": "AWS::Serverless-2016-10-31",
        "Description": format!("{} serverless application", config.name),
        "Resources": {
            function_id.clone(): {
                "Type": "AWS::Serverless::Function",
                "Properties": Value::Object(properties)
            }
        },
        "Outputs": {
            API_ENDPOINT_OUTPUT: {
                "Description": "API Gateway endpoint URL for the Prod stage",
                "Value": {
                    "Fn::Sub": "https://${ServerlessRestApi}.execute-api.${AWS::Region}.amazonaws.com/Prod/"
                }
            },
            "FunctionArn": {
                "Description": "Function ARN",
                "Value": { "Fn::GetAtt": [function_id, "Arn"] }
            }
        }
    })
}

fn policies(config: &DeploymentConfig) -> Vec<&'static str> {
    let mut policies = Vec::new();
    if config.s3_access {
        policies.push(S3_POLICY);
    }
    if config.dynamodb_access {
        policies.push(DYNAMODB_POLICY);
    }
    policies
}
