use crate::config::credentials::Credentials;
use crate::config::toml_config::SalesforceSettings;
use crate::domain::model::QueryResult;
use crate::domain::ports::CrmApi;
use crate::utils::error::{RelocatorError, Result};
use crate::utils::retry::RetryPolicy;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

const CLIENT_NAME: &str = "report-relocator";

/// Authenticated REST session against one Salesforce org.
pub struct SalesforceClient {
    client: Client,
    instance_url: String,
    session_id: String,
    api_version: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    message: String,
    error_code: String,
}

impl SalesforceClient {
    /// Username/password login through the SOAP partner endpoint.
    ///
    /// Not retried: a failed login ends the run.
    pub async fn login(
        credentials: &Credentials,
        settings: &SalesforceSettings,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::new();
        let login_url = format!(
            "{}/services/Soap/u/{}",
            settings.login_base_url(),
            settings.api_version
        );

        tracing::debug!("Logging in as {} via {}", credentials.username, login_url);

        let response = client
            .post(&login_url)
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(login_envelope(credentials))
            .send()
            .await
            .map_err(|e| auth_error(format!("could not reach {}: {}", login_url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| auth_error(format!("could not read login response: {}", e)))?;

        if !status.is_success() {
            let fault = xml_element(&body, "faultstring")
                .or_else(|| xml_element(&body, "exceptionMessage"))
                .unwrap_or_else(|| format!("login returned HTTP {}", status));
            return Err(auth_error(fault));
        }

        let session_id = xml_element(&body, "sessionId")
            .ok_or_else(|| auth_error("login response has no sessionId".to_string()))?;
        let server_url = xml_element(&body, "serverUrl")
            .ok_or_else(|| auth_error("login response has no serverUrl".to_string()))?;
        let instance_url = Url::parse(&server_url)
            .map_err(|e| auth_error(format!("invalid serverUrl '{}': {}", server_url, e)))?
            .origin()
            .ascii_serialization();

        Ok(Self::from_parts(
            client,
            &instance_url,
            &session_id,
            &settings.api_version,
            retry,
        ))
    }

    /// Wrap an existing session (e.g. one obtained elsewhere).
    pub fn with_session(
        instance_url: &str,
        session_id: &str,
        api_version: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self::from_parts(Client::new(), instance_url, session_id, api_version, retry)
    }

    fn from_parts(
        client: Client,
        instance_url: &str,
        session_id: &str,
        api_version: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            instance_url: instance_url.trim_end_matches('/').to_string(),
            session_id: session_id.to_string(),
            api_version: api_version.to_string(),
            retry,
        }
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn data_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    async fn query_once(&self, soql: &str) -> Result<QueryResult> {
        let mut url = Url::parse(&self.data_url("query"))?;
        url.query_pairs_mut().append_pair("q", soql);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.session_id)
            .send()
            .await?;
        let body = check_response(response).await?.text().await?;

        Ok(serde_json::from_str::<QueryResult>(&body)?)
    }

    async fn update_once(
        &self,
        object_type: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<()> {
        let url = self.data_url(&format!("sobjects/{}/{}", object_type, id));

        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.session_id)
            .json(fields)
            .send()
            .await?;
        check_response(response).await?;

        Ok(())
    }
}

#[async_trait]
impl CrmApi for SalesforceClient {
    async fn query(&self, soql: &str) -> Result<QueryResult> {
        tracing::debug!("SOQL: {}", soql);
        self.retry
            .execute("query", || self.query_once(soql))
            .await
    }

    async fn update(&self, object_type: &str, id: &str, fields: &Map<String, Value>) -> Result<()> {
        tracing::debug!("PATCH {} {} {}", object_type, id, serde_json::Value::Object(fields.clone()));
        self.retry
            .execute("update", || self.update_once(object_type, id, fields))
            .await
    }
}

/// Turns a non-2xx response into `ApiError`, using the REST error body when present.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (error_code, message) = match serde_json::from_str::<Vec<ApiErrorBody>>(&body) {
        Ok(errors) if !errors.is_empty() => (errors[0].error_code.clone(), errors[0].message.clone()),
        _ => (
            status
                .canonical_reason()
                .unwrap_or("UNKNOWN_ERROR")
                .to_string(),
            body.chars().take(200).collect(),
        ),
    };

    Err(RelocatorError::ApiError {
        status: status.as_u16(),
        error_code,
        message,
    })
}

fn auth_error(message: String) -> RelocatorError {
    RelocatorError::AuthenticationError { message }
}

fn login_envelope(credentials: &Credentials) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope
        xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
        xmlns:urn="urn:partner.soap.sforce.com">
    <env:Header>
        <urn:CallOptions>
            <urn:client>{client}</urn:client>
        </urn:CallOptions>
    </env:Header>
    <env:Body>
        <n1:login xmlns:n1="urn:partner.soap.sforce.com">
            <n1:username>{username}</n1:username>
            <n1:password>{password}{token}</n1:password>
        </n1:login>
    </env:Body>
</env:Envelope>"#,
        client = CLIENT_NAME,
        username = escape_xml(&credentials.username),
        password = escape_xml(&credentials.password),
        token = escape_xml(&credentials.security_token),
    )
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Text of the first `<name>` element, with or without a namespace prefix.
fn xml_element(xml: &str, name: &str) -> Option<String> {
    let pattern = format!(
        r"<(?:[\w-]+:)?{0}(?:\s[^>]*)?>([^<]*)</(?:[\w-]+:)?{0}>",
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(xml)
        .and_then(|caps| caps.get(1))
        .map(|m| unescape_xml(m.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
  <soapenv:Body>
    <loginResponse>
      <result>
        <serverUrl>https://acme.my.salesforce.com/services/Soap/u/59.0/00D000000000001</serverUrl>
        <sessionId>00D000000000001!AQ4AQ&amp;xyz</sessionId>
      </result>
    </loginResponse>
  </soapenv:Body>
</soapenv:Envelope>"#;

    #[test]
    fn test_xml_element_reads_login_response() {
        assert_eq!(
            xml_element(LOGIN_RESPONSE, "sessionId").as_deref(),
            Some("00D000000000001!AQ4AQ&xyz")
        );
        assert!(xml_element(LOGIN_RESPONSE, "serverUrl")
            .unwrap()
            .starts_with("https://acme.my.salesforce.com/"));
        assert_eq!(xml_element(LOGIN_RESPONSE, "faultstring"), None);
    }

    #[test]
    fn test_xml_element_with_prefix_and_attributes() {
        let fault = r#"<soapenv:Fault><faultcode>sf:INVALID_LOGIN</faultcode><faultstring xml:lang="en">INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring></soapenv:Fault>"#;
        assert_eq!(
            xml_element(fault, "faultcode").as_deref(),
            Some("sf:INVALID_LOGIN")
        );
        assert!(xml_element(fault, "faultstring")
            .unwrap()
            .starts_with("INVALID_LOGIN"));
    }

    #[test]
    fn test_login_envelope_escapes_credentials() {
        let credentials = Credentials::new("ops@example.com", "p<ss&word", "TOK");
        let envelope = login_envelope(&credentials);

        assert!(envelope.contains("<n1:username>ops@example.com</n1:username>"));
        assert!(envelope.contains("<n1:password>p&lt;ss&amp;wordTOK</n1:password>"));
    }

    #[test]
    fn test_data_urls() {
        let client = SalesforceClient::with_session(
            "https://acme.my.salesforce.com/",
            "SESSION",
            "59.0",
            RetryPolicy::none(),
        );

        assert_eq!(client.instance_url(), "https://acme.my.salesforce.com");
        assert_eq!(
            client.data_url("sobjects/Report/00O1"),
            "https://acme.my.salesforce.com/services/data/v59.0/sobjects/Report/00O1"
        );
    }
}
