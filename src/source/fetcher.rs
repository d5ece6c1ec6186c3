//! Fetch requests issued by the engine and the responses fed back to it.
//!
//! The engine never awaits anything. It emits a [`FetchRequest`] as an
//! action; the driver runs [`fetch_with_retry`] and hands the resulting
//! [`FetchResponse`] back as an event. The ticket travels with both so the
//! cache can tell whether the response still belongs to a live fetch.

use super::catalog::CatalogSource;
use crate::cache::FetchTicket;
use crate::domain::{FetchError, Item, SortOrder};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::rc::Rc;

/// Upstream parameters for one ticketed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub category: Option<String>,
    pub sort_order: SortOrder,
}

impl FetchRequest {
    /// Derives the upstream parameters from the ticket's key.
    ///
    /// Only category and sort order reach the upstream; search text and
    /// rating are applied to the returned set.
    #[must_use]
    pub fn for_ticket(ticket: FetchTicket) -> Self {
        Self {
            category: ticket.key.category.name().map(String::from),
            sort_order: ticket.key.sort_order,
            ticket,
        }
    }
}

/// Outcome of a [`FetchRequest`], tagged with its ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub ticket: FetchTicket,
    pub outcome: Result<Vec<Item>, FetchError>,
    /// Number of `fetch_raw` calls made, including retries.
    pub attempts: u32,
}

/// Starts `request` against `source`, retrying transient failures
/// immediately up to `retries` times.
///
/// The first `fetch_raw` call is made before this function returns, so the
/// upstream sees the request at dispatch time rather than at first poll.
///
/// # Parameters
///
/// * `source` - Catalog to call
/// * `request` - Ticketed upstream parameters
/// * `retries` - Extra attempts allowed after a transient failure
///
/// # Returns
///
/// A future resolving to the response for the request's ticket.
/// Non-transient failures are returned after the first attempt.
pub fn fetch_with_retry<S>(
    source: Rc<S>,
    request: FetchRequest,
    retries: u32,
) -> LocalBoxFuture<'static, FetchResponse>
where
    S: CatalogSource + ?Sized + 'static,
{
    let first = source.fetch_raw(request.category.as_deref(), request.sort_order);

    async move {
        let mut attempts = 1;
        let mut outcome = first.await;
        while let Err(error) = &outcome {
            if !error.is_transient() || attempts > retries {
                break;
            }
            tracing::debug!(
                ticket = request.ticket.id,
                attempt = attempts,
                error = %error,
                "transient fetch failure, retrying"
            );
            attempts += 1;
            outcome = source
                .fetch_raw(request.category.as_deref(), request.sort_order)
                .await;
        }

        if let Ok(items) = &outcome {
            tracing::debug!(ticket = request.ticket.id, raw_items = items.len(), attempts, "fetch finished");
        }
        FetchResponse {
            ticket: request.ticket,
            outcome,
            attempts,
        }
    }
    .boxed_local()
}
