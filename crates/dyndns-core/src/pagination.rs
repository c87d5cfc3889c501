//! Generic traversal of the provider's paginated listings
//!
//! Linode wraps every listing in a `{page, pages, data}` envelope. The walk
//! starts at page 1, scans items in provider-returned order and stops at the
//! first predicate match; pages are only advanced while the server reports
//! more of them. The envelope fields are mandatory: a reply without `page`
//! or `pages` is a protocol-shape error, never silently treated as a single
//! page.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::future::Future;

/// One validated page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in provider-returned order
    pub items: Vec<T>,
    /// This page's number, 1-based
    pub number: u32,
    /// Total number of pages
    pub total: u32,
}

/// Wire envelope before validation; `page`/`pages` may be absent
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    page: Option<u32>,
    pages: Option<u32>,
    data: Vec<T>,
}

/// Decode and validate one page envelope
///
/// `what` names the listing ("domains", "records") for error context.
pub fn decode_page<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<Page<T>> {
    let envelope: Envelope<T> = serde_json::from_value(value)?;
    let number = match envelope.page {
        Some(n) if n >= 1 => n,
        _ => {
            return Err(Error::protocol_shape(format!(
                "page missing from {what} reply"
            )));
        }
    };
    let total = match envelope.pages {
        Some(n) if n >= 1 => n,
        _ => {
            return Err(Error::protocol_shape(format!(
                "page count missing from {what} reply"
            )));
        }
    };
    Ok(Page {
        items: envelope.data,
        number,
        total,
    })
}

/// Walk a paginated listing and return the first item matching `predicate`
///
/// Pages are fetched one at a time and scanned fully in provider order, so
/// the first match by page order wins even if a "better" match exists on a
/// later page. Exhausting the listing yields [`Error::NotFound`] carrying
/// `what`; any fetch or envelope failure short-circuits immediately.
pub async fn find_matching<T, F, Fut, P>(
    mut fetch_page: F,
    mut predicate: P,
    what: &str,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
    P: FnMut(&T) -> bool,
{
    let mut number = 1u32;
    loop {
        let page = fetch_page(number).await?;
        let (current, total) = (page.number, page.total);
        if let Some(item) = page.items.into_iter().find(&mut predicate) {
            return Ok(item);
        }
        if current >= total {
            return Err(Error::not_found(what.to_string()));
        }
        number += 1;
    }
}
