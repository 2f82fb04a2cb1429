// This makes `http_api::routing` less messy at the cost of coupling to `axum`
// even more.
#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::extract::{Request, State};

use crate::{error::Error, misc::SyncedStatus};

pub async fn is_synced(
    State(is_synced): State<Arc<SyncedStatus>>,
    request: Request,
) -> Result<Request, Error> {
    is_synced
        .get()
        .then_some(request)
        .ok_or(Error::NodeIsSyncing)
}
