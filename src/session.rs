use thiserror::Error;

use crate::db::TreeStore;
use crate::model::User;
use crate::tree::{AcademicTree, TreeError};

#[derive(Debug, Error)]
pub enum MutateError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("failed to persist tree: {0:#}")]
    Store(anyhow::Error),
}

/// The signed-in user and their tree. Lives from sign-in to sign-out.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    tree: AcademicTree,
}

impl Session {
    /// Load the user's tree wholesale; a user with nothing stored starts empty.
    pub fn open<S: TreeStore + ?Sized>(store: &S, user: User) -> anyhow::Result<Self> {
        let tree = store
            .load_tree(&user.id)?
            .unwrap_or_else(|| AcademicTree::new(&user.id));
        Ok(Self { user, tree })
    }

    pub fn tree(&self) -> &AcademicTree {
        &self.tree
    }

    /// Apply one mutation and persist the whole tree. A failed mutation or a failed save
    /// leaves the tree exactly as it was before the call.
    pub fn mutate<S, T, F>(&mut self, store: &S, f: F) -> Result<T, MutateError>
    where
        S: TreeStore + ?Sized,
        F: FnOnce(&mut AcademicTree) -> Result<T, TreeError>,
    {
        let before = self.tree.clone();
        let out = match f(&mut self.tree) {
            Ok(v) => v,
            Err(e) => {
                self.tree = before;
                return Err(e.into());
            }
        };
        if let Err(e) = store.save_tree(&self.user.id, &self.tree) {
            tracing::warn!(user_id = %self.user.id, error = %e, "tree save failed, reverting");
            self.tree = before;
            return Err(MutateError::Store(e));
        }
        tracing::debug!(user_id = %self.user.id, "tree saved");
        Ok(out)
    }

    /// Swap in a whole new tree (backup import) under the same save/revert rule.
    pub fn replace<S: TreeStore + ?Sized>(
        &mut self,
        store: &S,
        tree: AcademicTree,
    ) -> Result<(), MutateError> {
        self.mutate(store, |current| {
            *current = tree;
            Ok(())
        })
    }
}
