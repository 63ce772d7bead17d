//! Derives `Content-Security-Policy` rules from CSP violation reports. Reports collected while a
//! site runs under a deliberately strict probe policy are turned into the least-permissive policy
//! per document that would have allowed everything the site actually loaded.

pub mod capture;
pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod reports;
pub mod sources;
