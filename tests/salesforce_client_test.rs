use anyhow::Result;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use report_relocator::config::toml_config::SalesforceSettings;
use report_relocator::core::CrmApi;
use report_relocator::utils::retry::RetryPolicy;
use report_relocator::{Credentials, RelocatorError, SalesforceClient};
use serde_json::{json, Map, Value};
use std::time::Duration;

fn settings_for(server: &MockServer) -> SalesforceSettings {
    SalesforceSettings {
        login_url: Some(server.base_url()),
        ..Default::default()
    }
}

fn login_ok_body(server: &MockServer) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
  <soapenv:Body>
    <loginResponse>
      <result>
        <serverUrl>{}/services/Soap/u/59.0/00D000000000001</serverUrl>
        <sessionId>SESSION-123</sessionId>
      </result>
    </loginResponse>
  </soapenv:Body>
</soapenv:Envelope>"#,
        server.base_url()
    )
}

fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries)
        .with_base_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

#[tokio::test]
async fn test_soap_login_sends_password_with_token() -> Result<()> {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/services/Soap/u/59.0")
                .header("SOAPAction", "login")
                .body_contains("<n1:username>ops@example.com</n1:username>")
                .body_contains("<n1:password>secretTOKEN</n1:password>");
            then.status(200)
                .header("Content-Type", "text/xml")
                .body(login_ok_body(&server));
        })
        .await;

    let credentials = Credentials::new("ops@example.com", "secret", "TOKEN");
    let client =
        SalesforceClient::login(&credentials, &settings_for(&server), RetryPolicy::none()).await?;

    login.assert_async().await;
    assert_eq!(client.instance_url(), server.base_url());
    Ok(())
}

#[tokio::test]
async fn test_invalid_login_is_authentication_error() -> Result<()> {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/services/Soap/u/59.0");
            then.status(500)
                .header("Content-Type", "text/xml")
                .body(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <soapenv:Fault>
      <faultcode>INVALID_LOGIN</faultcode>
      <faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>
    </soapenv:Fault>
  </soapenv:Body>
</soapenv:Envelope>"#,
                );
        })
        .await;

    let credentials = Credentials::new("ops@example.com", "wrong", "");
    let result =
        SalesforceClient::login(&credentials, &settings_for(&server), fast_retries(3)).await;

    // login is never retried
    login.assert_hits_async(1).await;
    match result {
        Err(RelocatorError::AuthenticationError { message }) => {
            assert!(message.starts_with("INVALID_LOGIN"));
        }
        Err(other) => panic!("expected authentication error, got {}", other),
        Ok(_) => panic!("expected authentication error, got a session"),
    }
    Ok(())
}

#[tokio::test]
async fn test_query_uses_session_and_parses_records() -> Result<()> {
    let server = MockServer::start_async().await;
    let soql = "SELECT Id FROM Folder WHERE Name = 'Sales' AND Type = 'Report'";
    let query = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/services/data/v59.0/query")
                .query_param("q", soql)
                .header("Authorization", "Bearer SESSION-123");
            then.status(200).json_body(json!({
                "totalSize": 1,
                "done": true,
                "records": [{"attributes": {"type": "Folder"}, "Id": "00l000000000100"}]
            }));
        })
        .await;

    let client = SalesforceClient::with_session(
        &server.base_url(),
        "SESSION-123",
        "59.0",
        RetryPolicy::none(),
    );
    let result = client.query(soql).await?;

    query.assert_async().await;
    assert_eq!(result.total_size, 1);
    assert_eq!(result.records[0].id, "00l000000000100");
    Ok(())
}

#[tokio::test]
async fn test_update_retries_transient_failures() -> Result<()> {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PATCH).path("/services/data/v59.0/sobjects/Report/R1");
            then.status(503).json_body(json!([
                {"message": "Server temporarily unavailable", "errorCode": "SERVER_UNAVAILABLE"}
            ]));
        })
        .await;

    let client =
        SalesforceClient::with_session(&server.base_url(), "SESSION-123", "59.0", fast_retries(2));
    let mut fields = Map::new();
    fields.insert("FolderId".to_string(), Value::String("F100".to_string()));

    let result = client.update("Report", "R1", &fields).await;

    update.assert_hits_async(3).await;
    assert!(matches!(
        result,
        Err(RelocatorError::ApiError { status: 503, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_update_does_not_retry_permanent_failures() -> Result<()> {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PATCH).path("/services/data/v59.0/sobjects/Report/R404");
            then.status(404).json_body(json!([
                {"message": "The requested resource does not exist", "errorCode": "NOT_FOUND"}
            ]));
        })
        .await;

    let client =
        SalesforceClient::with_session(&server.base_url(), "SESSION-123", "59.0", fast_retries(3));
    let mut fields = Map::new();
    fields.insert("FolderId".to_string(), Value::String("F100".to_string()));

    let result = client.update("Report", "R404", &fields).await;

    update.assert_hits_async(1).await;
    match result {
        Err(RelocatorError::ApiError {
            status,
            error_code,
            message,
        }) => {
            assert_eq!(status, 404);
            assert_eq!(error_code, "NOT_FOUND");
            assert_eq!(message, "The requested resource does not exist");
        }
        other => panic!("expected API error, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[tokio::test]
async fn test_malformed_query_body_is_not_retried() -> Result<()> {
    let server = MockServer::start_async().await;
    let query = server
        .mock_async(|when, then| {
            when.method(GET).path("/services/data/v59.0/query");
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<html>maintenance</html>");
        })
        .await;

    let client =
        SalesforceClient::with_session(&server.base_url(), "SESSION-123", "59.0", fast_retries(3));
    let result = client.query("SELECT Id FROM Folder").await;

    query.assert_hits_async(1).await;
    assert!(matches!(result, Err(RelocatorError::SerializationError(_))));
    Ok(())
}
