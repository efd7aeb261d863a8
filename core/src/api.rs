//! One-shot requests.
//!
//! Each call opens a [`Session`] over a fresh libcurl handle, sends one
//! request and drops the session, releasing the handle. Use a session
//! directly to reuse connections across requests.

use crate::error::Result;
use crate::request::RequestOptions;
use crate::response::Response;
use crate::session::Session;

pub fn request(method: &str, url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().request(method, url, options)
}

pub fn get(url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().get(url, options)
}

/// Redirects are not followed unless the options ask for it.
pub fn head(url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().head(url, options)
}

pub fn post(url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().post(url, options)
}

pub fn put(url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().put(url, options)
}

pub fn patch(url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().patch(url, options)
}

pub fn delete(url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().delete(url, options)
}

pub fn options(url: &str, options: RequestOptions) -> Result<Response> {
    Session::new().options(url, options)
}
