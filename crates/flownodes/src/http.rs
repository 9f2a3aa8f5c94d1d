use async_trait::async_trait;
use flowcore::{
    AuthConfig, Credentials, HttpClient, HttpError, HttpRequest, HttpResponse, KeyPlacement,
    Value, ValueExt,
};
use reqwest::{Method, RequestBuilder};
use serde_json::Map;
use std::time::Duration;

/// `HttpClient` backed by a shared `reqwest::Client`.
///
/// Every status code is returned as a response; only transport failures and
/// timeouts are errors.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    fn build(&self, request: HttpRequest) -> Result<RequestBuilder, HttpError> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|_| HttpError::InvalidRequest(format!("Unsupported method: {}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.to_display_string());
        }

        if !request.params.is_empty() {
            let params: Vec<(&str, String)> = request
                .params
                .iter()
                .map(|(k, v)| (k.as_str(), v.to_display_string()))
                .collect();
            builder = builder.query(&params);
        }

        builder = match request.data {
            None | Some(Value::Null) => builder,
            Some(Value::String(text)) => builder.body(text),
            Some(body) => builder.json(&body),
        };

        Ok(match &request.auth {
            Some(auth) => apply_auth(builder, auth),
            None => builder,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_builder() {
            HttpError::InvalidRequest(err.to_string())
        } else {
            HttpError::Transport(format!("No response received from server: {}", err))
        }
    }
}

/// Attach credentials to the request. Unsupported or malformed bundles are
/// reported and the request goes out without them.
fn apply_auth(builder: RequestBuilder, auth: &AuthConfig) -> RequestBuilder {
    let credentials = match auth.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::warn!(
                auth_config = %auth.id,
                "Malformed {} credentials: {}",
                auth.auth_type.as_str(),
                e
            );
            return builder;
        }
    };

    match credentials {
        Credentials::ApiKey(key) => match key.placement {
            KeyPlacement::Header => builder.header(key.key_name.as_str(), key.key_value),
            KeyPlacement::Query => builder.query(&[(key.key_name, key.key_value)]),
        },
        Credentials::Basic(basic) => builder.basic_auth(basic.username, Some(basic.password)),
        Credentials::Bearer(bearer) => builder.bearer_auth(bearer.token),
        Credentials::OAuth2(oauth) => match oauth.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        },
        Credentials::Unsupported(auth_type) => {
            tracing::warn!(auth_config = %auth.id, "Unsupported auth type: {}", auth_type.as_str());
            builder
        }
    }
}

/// JSON when the body parses, text otherwise; an empty body is null.
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        tracing::debug!("Request: {} {}", request.method, request.url);

        let response = self
            .build(request)?
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers: Map<String, Value> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()),
                )
            })
            .collect();

        tracing::debug!("Response: {} {}", status, response.url());

        let text = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(HttpResponse {
            status,
            data: parse_body(text),
            headers,
        })
    }
}
