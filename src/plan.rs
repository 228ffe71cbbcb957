use std::collections::HashSet;

use crate::error::ConfigError;
use crate::repository::RepoId;

/// Copy one source branch into its own destination repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationTask {
    pub source_branch: String,
    pub destination: RepoId,
}

impl MigrationTask {
    pub fn new(source_branch: impl Into<String>, destination: RepoId) -> Self {
        MigrationTask {
            source_branch: source_branch.into(),
            destination,
        }
    }
}

/// Tasks in processing order. Branches and destinations are unique.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationPlan {
    tasks: Vec<MigrationTask>,
}

impl MigrationPlan {
    pub fn new(tasks: Vec<MigrationTask>) -> Result<Self, ConfigError> {
        if tasks.is_empty() {
            return Err(ConfigError::EmptyPlan);
        }

        let mut branches = HashSet::new();
        let mut destinations = HashSet::new();
        for task in tasks.iter() {
            if task.source_branch.trim().is_empty() {
                return Err(ConfigError::EmptyBranch);
            }
            if !branches.insert(task.source_branch.as_str()) {
                return Err(ConfigError::DuplicateBranch(task.source_branch.clone()));
            }
            if !destinations.insert(&task.destination) {
                return Err(ConfigError::DuplicateDestination(
                    task.destination.to_string(),
                ));
            }
        }

        Ok(MigrationPlan { tasks })
    }

    /// Builds a plan from `(branch, destination id)` pairs.
    pub fn from_pairs<I, B, D>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (B, D)>,
        B: Into<String>,
        D: AsRef<str>,
    {
        let tasks = pairs
            .into_iter()
            .map(|(branch, destination)| {
                RepoId::new(destination.as_ref()).map(|id| MigrationTask::new(branch, id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        MigrationPlan::new(tasks)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationTask> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<'a> IntoIterator for &'a MigrationPlan {
    type Item = &'a MigrationTask;
    type IntoIter = std::slice::Iter<'a, MigrationTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
