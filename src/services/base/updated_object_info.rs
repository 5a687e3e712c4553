
use crate::contracts::options::Preconditions;
use crate::contracts::request_context::RequestContext;
use crate::services::base::status::Status;
use crate::services::base::types::RegistryResource;

/// Describes how to compute the new state of an object during an update
pub trait UpdatedObjectInfo<R>: Send + Sync
where
    R: RegistryResource,
{
    /// Preconditions the stored object must satisfy before it is updated
    fn preconditions(&self) -> Option<Preconditions>;

    /// Produces the updated object from the currently stored one
    fn updated_object(&self, ctx: &RequestContext, old: &R) -> Result<R, Status>;
}

/// Replaces the stored object with the given value
pub struct DefaultUpdatedObjectInfo<R> {
    object: R,
}

impl<R> DefaultUpdatedObjectInfo<R>
where
    R: RegistryResource,
{
    pub fn new(object: R) -> Self {
        DefaultUpdatedObjectInfo { object }
    }

    pub fn object_name(&self) -> String {
        self.object.meta().name.clone().unwrap_or_default()
    }
}

impl<R> UpdatedObjectInfo<R> for DefaultUpdatedObjectInfo<R>
where
    R: RegistryResource,
{
    fn preconditions(&self) -> Option<Preconditions> {
        self.object
            .meta()
            .uid
            .as_ref()
            .filter(|uid| !uid.is_empty())
            .map(|uid| Preconditions {
                uid: Some(uid.clone()),
                resource_version: None,
            })
    }

    fn updated_object(&self, _: &RequestContext, _: &R) -> Result<R, Status> {
        Ok(self.object.clone())
    }
}
