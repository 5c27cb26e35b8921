//! HTTP header utilities for LLM providers

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE,
};

/// Common HTTP headers used across providers
pub struct CommonHeaders;

impl CommonHeaders {
    /// Content-Type: application/json
    pub fn json_content_type() -> (HeaderName, HeaderValue) {
        (CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    /// Authorization header with Bearer token
    pub fn bearer_auth(token: &str) -> Result<(HeaderName, HeaderValue), InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        Ok((AUTHORIZATION, value))
    }
}

/// Builder for HTTP headers with provider-specific customizations
pub struct HeaderBuilder {
    headers: HeaderMap,
}

impl HeaderBuilder {
    /// Create a new header builder
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// Add content type JSON
    pub fn json_content_type(mut self) -> Self {
        let (name, value) = CommonHeaders::json_content_type();
        self.headers.insert(name, value);
        self
    }

    /// Add Bearer authorization
    pub fn bearer_auth(mut self, token: &str) -> Result<Self, InvalidHeaderValue> {
        let (name, value) = CommonHeaders::bearer_auth(token)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add a custom header with a static name
    pub fn header(mut self, name: &'static str, value: &str) -> Result<Self, InvalidHeaderValue> {
        self.headers
            .insert(HeaderName::from_static(name), HeaderValue::from_str(value)?);
        Ok(self)
    }

    /// Build the header map
    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

impl Default for HeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// OpenRouter attribution headers
pub struct OpenRouterHeaders {
    pub referer: String,
    pub title: String,
}

impl OpenRouterHeaders {
    pub fn new() -> Self {
        Self {
            referer: "https://github.com/your-org/codepad".to_string(),
            title: "codepad".to_string(),
        }
    }

    /// Apply the attribution headers to a builder
    pub fn apply(&self, builder: HeaderBuilder) -> Result<HeaderBuilder, InvalidHeaderValue> {
        builder
            .header("http-referer", &self.referer)?
            .header("x-title", &self.title)
    }
}

impl Default for OpenRouterHeaders {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_headers() {
        let (name, value) = CommonHeaders::json_content_type();
        assert_eq!(name, CONTENT_TYPE);
        assert_eq!(value, "application/json");

        let (name, value) = CommonHeaders::bearer_auth("test-token").unwrap();
        assert_eq!(name, AUTHORIZATION);
        assert_eq!(value, "Bearer test-token");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_openrouter_headers() {
        let headers = OpenRouterHeaders::new()
            .apply(
                HeaderBuilder::new()
                    .json_content_type()
                    .bearer_auth("test-api-key")
                    .unwrap(),
            )
            .unwrap()
            .build();

        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer test-api-key");
        assert_eq!(
            headers.get("HTTP-Referer").unwrap(),
            "https://github.com/your-org/codepad"
        );
        assert_eq!(headers.get("X-Title").unwrap(), "codepad");
    }

    #[test]
    fn test_bearer_rejects_newlines() {
        assert!(HeaderBuilder::new().bearer_auth("bad\nkey").is_err());
    }
}
