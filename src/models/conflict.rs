use serde::{Deserialize, Serialize};

use super::Class;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRef {
    pub id: String,
    pub title: String,
}

impl From<&Class> for ClassRef {
    fn from(class: &Class) -> Self {
        Self {
            id: class.id.clone(),
            title: class.title.clone(),
        }
    }
}

/// A detected double-booking. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictAlert {
    pub message: String,
    pub severity: Severity,
    pub teacher_id: String,
    pub first: ClassRef,
    pub second: ClassRef,
}
