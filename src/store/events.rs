//! Store change notifications

use std::fmt;

/// Collections held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Goals,
    Tasks,
    Knowledge,
    References,
    Dependencies,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Projects => "projects",
            Collection::Goals => "goals",
            Collection::Tasks => "tasks",
            Collection::Knowledge => "knowledge",
            Collection::References => "references",
            Collection::Dependencies => "dependencies",
        };
        f.write_str(name)
    }
}

/// Everything removed by a single cascading delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub projects: Vec<String>,
    pub goals: Vec<String>,
    pub tasks: Vec<String>,
    pub knowledge: Vec<String>,
    /// Number of dependency records dropped
    pub dependencies: usize,
    /// Number of knowledge references dropped
    pub references: usize,
}

impl CascadeReport {
    /// Total number of records removed
    pub fn total(&self) -> usize {
        self.projects.len()
            + self.goals.len()
            + self.tasks.len()
            + self.knowledge.len()
            + self.dependencies
            + self.references
    }
}

/// A change to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A whole collection was reloaded
    Replaced(Collection),
    /// One record was inserted or replaced
    Upserted(Collection, String),
    /// Relation records were removed
    Removed(Collection, Vec<String>),
    /// A delete cascaded through the hierarchy
    Cascade(CascadeReport),
}
