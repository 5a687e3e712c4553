use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDetails {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

impl ObjectDetails {
    pub fn new(kind: &str, name: &str, namespace: Option<String>) -> Self {
        ObjectDetails {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace,
        }
    }

    /// Details for the object kind `R`
    pub fn of<R>(name: &str, namespace: Option<String>) -> Self
    where
        R: kube::Resource<DynamicType = ()>,
    {
        ObjectDetails::new(R::kind(&()).as_ref(), name, namespace)
    }
}

impl Display for ObjectDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let namespace = self.namespace.as_deref().unwrap_or("unknown");
        write!(f, "{} '{}' in namespace '{}'", self.kind, self.name, namespace)
    }
}
