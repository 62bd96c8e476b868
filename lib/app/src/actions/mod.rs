//! Store-updating operations, grouped the way views consume them.

pub mod auth;
pub mod catalog;
pub mod enrollment;
pub mod users;

use std::future::Future;

use openlms_client::ApiError;
use openlms_core::ListResponse;
use openlms_flux::Slice;

use crate::state::ResourceState;
use crate::App;

/// Shared list-loading shape: mark the slice loading, run the fetch,
/// store the rows or the error. Previously-loaded rows stay visible
/// throughout.
pub(crate) async fn run_load<T, F>(app: &App, fetch: F) -> Result<(), ApiError>
where
    T: Clone + Send + Sync + 'static,
    ResourceState<T>: Slice,
    F: Future<Output = Result<ListResponse<T>, ApiError>>,
{
    let prev = app
        .store()
        .read::<ResourceState<T>>()
        .unwrap_or_default()
        .data;
    app.store().put(ResourceState::loading(prev));

    match fetch.await {
        Ok(list) => {
            app.store().put(ResourceState::loaded(list.items));
            Ok(())
        }
        Err(e) => {
            let prev = app
                .store()
                .read::<ResourceState<T>>()
                .unwrap_or_default()
                .data;
            app.store().put(ResourceState::failed(prev, e.to_string()));
            Err(e)
        }
    }
}
