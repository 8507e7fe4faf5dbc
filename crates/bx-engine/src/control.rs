//! `EngineControl`: the narrow, non-generic slice of `Engine` the manager
//! needs (spec.md §6's `ConcurrencyController` — submit/adjust/shutdown).
//! Lets `bx-manager` depend on a trait object instead of on `Engine<T,R,V>`
//! for every work-item/record/value type.

use async_trait::async_trait;
use bx_common::ConcurrencySettings;

use crate::engine::Engine;

#[async_trait]
pub trait EngineControl: Send + Sync {
    async fn adjust_concurrency(&self, settings: ConcurrencySettings);
    fn abort(&self, reason: String);
    fn is_aborted(&self) -> bool;
    fn current_settings(&self) -> ConcurrencySettings;
}

#[async_trait]
impl<T, R, V> EngineControl for Engine<T, R, V>
where
    T: Send + Sync + Clone + 'static,
    R: Send + Sync + Clone + 'static,
    V: Send + Sync + 'static,
{
    async fn adjust_concurrency(&self, settings: ConcurrencySettings) {
        Engine::adjust_concurrency(self, settings).await
    }

    fn abort(&self, reason: String) {
        Engine::abort(self, reason)
    }

    fn is_aborted(&self) -> bool {
        Engine::is_aborted(self)
    }

    fn current_settings(&self) -> ConcurrencySettings {
        Engine::current_settings(self)
    }
}
