/*
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use std::time::Duration;

use reqwest::{
    blocking::Client as HttpClient, blocking::ClientBuilder as HttpClientBuilder,
    header::HeaderValue, header::ACCEPT, header::CONTENT_TYPE, StatusCode,
};
use tracing::debug;

pub use crate::OmevvError;
pub use reqwest::Method;

pub const OMEVV_ENDPOINT: &str = "omevv/GatewayService/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Decoded result of a single OMEVV REST call.
#[derive(Debug, Clone)]
pub struct Response {
    pub success: bool,
    pub status_code: u16,
    /// Decoded JSON body; `Value::Null` when the console returned no content
    /// (e.g. DELETE).
    pub json_data: serde_json::Value,
}

/// The REST seam every profile accessor talks through. The production
/// implementation is [`OmevvHttpClient`]; tests substitute a scripted fake.
pub trait RestClient {
    fn invoke_request(
        &self,
        method: Method,
        uri: &str,
        payload: Option<&serde_json::Value>,
    ) -> Result<Response, OmevvError>;
}

#[derive(Debug)]
pub struct OmevvClientPoolBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl OmevvClientPoolBuilder {
    /// Prevents the client from accepting self signed certificates and other
    /// invalid certificates.
    ///
    /// By default self signed certificates will be accepted, since OMEVV
    /// appliances usually use those.
    pub fn reject_invalid_certs(mut self) -> OmevvClientPoolBuilder {
        self.accept_invalid_certs = false;
        self
    }

    /// Overwrites the timeout that will be applied to every request
    pub fn timeout(mut self, timeout: Duration) -> OmevvClientPoolBuilder {
        self.timeout = timeout;
        self
    }

    /// Builds an OMEVV HTTP connection pool
    pub fn build(&self) -> Result<OmevvClientPool, OmevvError> {
        let http_client = HttpClientBuilder::new()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()
            .expect("reqwest client construction only fails on TLS backend misconfiguration");
        Ok(OmevvClientPool { http_client })
    }
}

/// The vCenter-registered console endpoint the client connects to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Endpoint {
    /// Hostname or IP address of the vCenter hosting the OMEVV appliance
    pub host: String,
    /// Port. If absent the default HTTPS port 443 will be used
    pub port: Option<u16>,
    /// vCenter username
    pub user: Option<String>,
    /// vCenter password
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OmevvClientPool {
    http_client: HttpClient,
}

impl OmevvClientPool {
    /// Returns Builder for configuring an OMEVV HTTP connection pool
    pub fn builder() -> OmevvClientPoolBuilder {
        OmevvClientPoolBuilder {
            timeout: DEFAULT_TIMEOUT,
            // OMEVV appliances commonly run with a self-signed cert
            accept_invalid_certs: true,
        }
    }

    /// Creates a client scoped to a single console endpoint
    pub fn create_client(&self, endpoint: Endpoint) -> OmevvHttpClient {
        OmevvHttpClient::new(self.http_client.clone(), endpoint)
    }
}

/// A HTTP client which targets a single OMEVV console
pub struct OmevvHttpClient {
    endpoint: Endpoint,
    http_client: HttpClient,
}

impl OmevvHttpClient {
    pub fn new(http_client: HttpClient, endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            http_client,
        }
    }

    fn url_for(&self, api: &str) -> String {
        match self.endpoint.port {
            Some(p) => format!(
                "https://{}:{}/{}{}",
                self.endpoint.host, p, OMEVV_ENDPOINT, api
            ),
            None => format!("https://{}/{}{}", self.endpoint.host, OMEVV_ENDPOINT, api),
        }
    }
}

impl RestClient for OmevvHttpClient {
    // All the HTTP requests happen from here.
    fn invoke_request(
        &self,
        method: Method,
        api: &str,
        payload: Option<&serde_json::Value>,
    ) -> Result<Response, OmevvError> {
        let url = self.url_for(api);
        let body_enc = match payload {
            Some(b) => Some(serde_json::to_string(b).map_err(|e| OmevvError::JsonSerialize {
                url: url.clone(),
                object_debug: format!("{b:?}"),
                source: e,
            })?),
            None => None,
        };
        debug!(
            "TX {} {} {}",
            method,
            url,
            body_enc.as_deref().unwrap_or_default()
        );

        let mut req_b = self
            .http_client
            .request(method, &url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(user) = &self.endpoint.user {
            req_b = req_b.basic_auth(user, self.endpoint.password.as_ref());
        }
        if let Some(b) = body_enc {
            req_b = req_b.body(b);
        }
        let response = req_b.send().map_err(|e| OmevvError::Network {
            url: url.clone(),
            source: e,
        })?;
        let status_code = response.status();
        // read the body even when not 2XX: the console puts its error code
        // and message in a JSON body
        let response_body = response.text().map_err(|e| OmevvError::Network {
            url: url.clone(),
            source: e,
        })?;
        let json_data = if response_body.is_empty() {
            debug!("RX {status_code}");
            serde_json::Value::Null
        } else {
            debug!("RX {status_code} {response_body}");
            match serde_json::from_str(&response_body) {
                Ok(v) => v,
                Err(e) => {
                    if status_code.is_success() {
                        return Err(OmevvError::JsonDeserialize {
                            url,
                            body: response_body,
                            source: e,
                        });
                    }
                    return Err(OmevvError::HttpStatus {
                        url,
                        status_code: status_code.as_u16(),
                    });
                }
            }
        };

        if !status_code.is_success() {
            return Err(api_error(url, status_code, &json_data));
        }
        Ok(Response {
            success: true,
            status_code: status_code.as_u16(),
            json_data,
        })
    }
}

// The console reports failures as {"errorCode": "...", "message": "..."}.
// Anything else becomes a bare HTTP status error.
fn api_error(url: String, status_code: StatusCode, body: &serde_json::Value) -> OmevvError {
    let code = body.get("errorCode").and_then(|c| c.as_str());
    let message = body.get("message").and_then(|m| m.as_str());
    match (code, message) {
        (Some(code), Some(message)) => OmevvError::Api {
            url,
            status_code: status_code.as_u16(),
            code: code.to_string(),
            message: message.to_string(),
        },
        _ => OmevvError::HttpStatus {
            url,
            status_code: status_code.as_u16(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // test_api_error_with_vendor_body tests that the console's errorCode and
    // message are carried into the Api variant.
    #[test]
    fn test_api_error_with_vendor_body() {
        let body = json!({"errorCode": "18001", "message": "Profile not found."});
        let err = api_error(
            "https://test/uri".to_string(),
            StatusCode::BAD_REQUEST,
            &body,
        );
        match err {
            OmevvError::Api {
                status_code,
                code,
                message,
                ..
            } => {
                assert_eq!(status_code, 400);
                assert_eq!(code, "18001");
                assert_eq!(message, "Profile not found.");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    // test_api_error_without_vendor_body tests the fallback for bodies that
    // are not in the console's error shape.
    #[test]
    fn test_api_error_without_vendor_body() {
        let err = api_error(
            "https://test/uri".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!("not an object"),
        );
        assert!(matches!(
            err,
            OmevvError::HttpStatus {
                status_code: 500,
                ..
            }
        ));
    }

    // test_url_for_appends_endpoint_prefix tests URL composition with and
    // without an explicit port.
    #[test]
    fn test_url_for_appends_endpoint_prefix() {
        let pool = OmevvClientPool::builder().build().unwrap();
        let client = pool.create_client(Endpoint {
            host: "vcenter.example.com".to_string(),
            ..Default::default()
        });
        assert_eq!(
            client.url_for("/RepositoryProfiles"),
            "https://vcenter.example.com/omevv/GatewayService/v1/RepositoryProfiles"
        );

        let client = pool.create_client(Endpoint {
            host: "vcenter.example.com".to_string(),
            port: Some(8443),
            ..Default::default()
        });
        assert_eq!(
            client.url_for("/RepositoryProfiles/1000"),
            "https://vcenter.example.com:8443/omevv/GatewayService/v1/RepositoryProfiles/1000"
        );
    }
}
