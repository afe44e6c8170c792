pub mod error;
pub mod rest_api;
pub mod state;
pub mod validate;

use std::{convert::Infallible, ops::Deref, sync::Arc};

use flicks_dal::movie::MovieStore;

use crate::state::AppState;

/// Movie store extracted from application state.
pub struct Movies(Arc<dyn MovieStore>);

impl Deref for Movies {
    type Target = dyn MovieStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl axum::extract::FromRequestParts<AppState> for Movies {
    type Rejection = Infallible;

    fn from_request_parts(
        _parts: &mut http::request::Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
           + core::marker::Send {
        futures::future::ready(Ok(Movies(state.movies())))
    }
}
