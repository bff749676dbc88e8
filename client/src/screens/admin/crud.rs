use std::marker::PhantomData;

use crate::api::{ApiClient, ApiError, Filters, Id, Resource, Writable};
use crate::screens::MessageState;
use crate::state::cache::QueryCache;

/// List/create/update/delete controller for one administrative resource.
/// Every successful mutation invalidates `R::CACHE_KEY`.
pub struct AdminCrud<R: Resource> {
    api: ApiClient,
    cache: QueryCache,
    pub message: MessageState,
    _resource: PhantomData<R>,
}

impl<R: Resource> Clone for AdminCrud<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
            message: self.message.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> AdminCrud<R> {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            message: MessageState::default(),
            _resource: PhantomData,
        }
    }

    pub async fn list(&self) -> Result<Vec<R::Item>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch(R::CACHE_KEY, || async move { api.list::<R>(&Filters::new()).await })
            .await
    }

    /// Filtered lists bypass the cache.
    pub async fn search(&self, filters: &Filters) -> Result<Vec<R::Item>, ApiError> {
        self.api.list::<R>(filters).await
    }

    pub async fn get(&self, id: Id) -> Result<R::Item, ApiError> {
        self.api.get::<R>(id).await
    }

    pub async fn delete(&mut self, id: Id) -> Result<(), ApiError> {
        let api = self.api.clone();
        let result = self
            .cache
            .mutate(vec![R::CACHE_KEY], async move { api.delete::<R>(id).await })
            .await;
        self.message.record(result, "Registro eliminado.")
    }
}

impl<R> AdminCrud<R>
where
    R: Writable,
    R::Payload: 'static,
{
    pub async fn create(&mut self, payload: R::Payload) -> Result<R::Item, ApiError> {
        let api = self.api.clone();
        let result = self
            .cache
            .mutate(vec![R::CACHE_KEY], async move { api.create::<R>(&payload).await })
            .await;
        self.message.record(result, "Registro creado.")
    }

    pub async fn update(&mut self, id: Id, payload: R::Payload) -> Result<R::Item, ApiError> {
        let api = self.api.clone();
        let result = self
            .cache
            .mutate(vec![R::CACHE_KEY], async move {
                api.update::<R>(id, &payload).await
            })
            .await;
        self.message.record(result, "Registro actualizado.")
    }
}
