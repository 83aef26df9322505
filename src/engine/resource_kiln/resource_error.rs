use crate::ResourceTypeTag;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoxedError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
pub enum ResourceError
{
    /// The lifecycler could not produce the resource; nothing was cached
    Creation
    {
        type_tag: ResourceTypeTag,
        name: String,
        reason: BoxedError,
    },
    /// No manager for the tag, or (for query-only lookups) no resource with the name
    NotFound
    {
        type_tag: String,
        name: Option<String>,
    },
    DuplicateRegistration(ResourceTypeTag),
    InvalidName
    {
        type_tag: ResourceTypeTag,
    },
    /// A type-erased create received a loader the manager can't use
    LoaderMismatch
    {
        type_tag: ResourceTypeTag,
        expected: &'static str,
    },
    /// A typed lookup asked for a different manager type than the one registered
    TypeMismatch
    {
        type_tag: ResourceTypeTag,
        expected: &'static str,
    },
}
impl ResourceError
{
    #[must_use]
    pub fn manager_not_found(type_tag: &str) -> Self
    {
        Self::NotFound { type_tag: type_tag.to_string(), name: None }
    }

    #[must_use]
    pub fn resource_not_found(type_tag: ResourceTypeTag, name: &str) -> Self
    {
        Self::NotFound { type_tag: type_tag.to_string(), name: Some(name.to_string()) }
    }

    #[inline] #[must_use]
    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }
}
impl Display for ResourceError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            ResourceError::Creation { type_tag, name, reason } =>
                write!(f, "Failed to create {type_tag} '{name}': {reason}"),
            ResourceError::NotFound { type_tag, name: None } =>
                write!(f, "No resource manager registered for type '{type_tag}'"),
            ResourceError::NotFound { type_tag, name: Some(name) } =>
                write!(f, "No {type_tag} named '{name}'"),
            ResourceError::DuplicateRegistration(type_tag) =>
                write!(f, "A resource manager is already registered for type '{type_tag}'"),
            ResourceError::InvalidName { type_tag } =>
                write!(f, "Resource names must not be empty ({type_tag})"),
            ResourceError::LoaderMismatch { type_tag, expected } =>
                write!(f, "The {type_tag} manager requires a {expected} loader"),
            ResourceError::TypeMismatch { type_tag, expected } =>
                write!(f, "The manager registered for '{type_tag}' is not a {expected}"),
        }
    }
}
impl Error for ResourceError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match self
        {
            ResourceError::Creation { reason, .. } => Some(reason.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn messages()
    {
        assert_eq!("No resource manager registered for type 'sound'",
            ResourceError::manager_not_found("sound").to_string());
        assert_eq!("No mesh named 'hero'",
            ResourceError::resource_not_found(ResourceTypeTag::MESH, "hero").to_string());
        assert_eq!("A resource manager is already registered for type 'image'",
            ResourceError::DuplicateRegistration(ResourceTypeTag::IMAGE).to_string());
    }

    #[test]
    fn creation_exposes_reason_as_source()
    {
        let err = ResourceError::Creation
        {
            type_tag: ResourceTypeTag::IMAGE,
            name: "hero".to_string(),
            reason: "truncated PNG".into(),
        };
        assert_eq!("Failed to create image 'hero': truncated PNG", err.to_string());
        assert_eq!("truncated PNG", err.source().unwrap().to_string());
        assert!(!err.is_not_found());
    }
}
