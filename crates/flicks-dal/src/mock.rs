use futures::{FutureExt as _, future::BoxFuture};

use crate::{
    Batch, ListingParams,
    error::Result,
    movie::{Movie, MovieFilter, MovieStore},
};

/// Store that does nothing, handy for testing request handling without database.
///
/// It never fails, so it cannot produce `EditConflict` or `RecordNotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockMovieStore;

impl MovieStore for MockMovieStore {
    fn insert<'a>(&'a self, _movie: &'a mut Movie) -> BoxFuture<'a, Result<()>> {
        futures::future::ok(()).boxed()
    }

    fn get(&self, id: i64) -> BoxFuture<'_, Result<Movie>> {
        futures::future::ok(Movie {
            id,
            ..Default::default()
        })
        .boxed()
    }

    fn update<'a>(&'a self, _movie: &'a mut Movie) -> BoxFuture<'a, Result<()>> {
        futures::future::ok(()).boxed()
    }

    fn delete(&self, _id: i64) -> BoxFuture<'_, Result<()>> {
        futures::future::ok(()).boxed()
    }

    fn list<'a>(
        &'a self,
        _filter: &'a MovieFilter,
        params: ListingParams,
    ) -> BoxFuture<'a, Result<Batch<Movie>>> {
        futures::future::ok(Batch::empty(&params)).boxed()
    }
}
