/// Provides a shared instance of a service, e.g. a registry built by a backend
pub trait ServiceProvider<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    fn get(&self) -> T;
}
