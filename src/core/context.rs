//! Request context - what a step sees of the inbound HTTP request

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP method of a setup request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMethod {
    Get,
    Post,
}

/// A single inbound request to the setup entry point
///
/// Transport details (headers, cookies) are stripped by the web layer;
/// steps only get the method, the submitted form, and the query string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupRequest {
    /// Request method
    pub method: RequestMethod,

    /// Authenticated user driving the pipeline
    pub user_id: String,

    /// Submitted form fields (POST body)
    pub form: HashMap<String, String>,

    /// Query string parameters (e.g. OAuth callback codes)
    pub query: HashMap<String, String>,
}

impl SetupRequest {
    /// Create a GET request for a user
    pub fn get(user_id: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            user_id: user_id.into(),
            form: HashMap::new(),
            query: HashMap::new(),
        }
    }

    /// Create a POST request for a user with the given form fields
    pub fn post<I, K, V>(user_id: impl Into<String>, form: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: RequestMethod::Post,
            user_id: user_id.into(),
            form: form.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            query: HashMap::new(),
        }
    }

    /// Attach query string parameters
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Get a submitted form field (only POST requests carry a form)
    pub fn form_field(&self, key: &str) -> Option<&str> {
        match self.method {
            RequestMethod::Post => self.form.get(key).map(String::as_str),
            RequestMethod::Get => None,
        }
    }

    /// Get a query string parameter
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}
