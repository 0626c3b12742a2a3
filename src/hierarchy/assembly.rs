//! Assembly Hierarchy Manager
//!
//! Parts form a forest through `parent_part_id`. Links are validated on every
//! write, and every walk over the graph carries a visited set bounded by the
//! total part count so corrupt cyclic data cannot cause non-termination.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{cycle, not_found, Result};
use crate::models::Part;
use crate::state_machine::PartStatus;
use crate::store::EntityStore;

/// A child part that blocks its parent's dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteChild {
    pub id: Uuid,
    pub part_number: String,
    pub status: PartStatus,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub has_children: bool,
    /// True when every direct child is completed, or there are no children
    pub dependencies_met: bool,
    pub incomplete_children: Vec<IncompleteChild>,
}

/// One descendant in an assembly tree, with its depth below the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyNode {
    pub part: Part,
    pub depth: u32,
}

#[derive(Clone)]
pub struct AssemblyHierarchy {
    store: Arc<dyn EntityStore>,
}

impl AssemblyHierarchy {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Link `child_id` under `parent_id`, rejecting any link that closes a cycle
    pub async fn set_parent(&self, child_id: Uuid, parent_id: Uuid) -> Result<Part> {
        if child_id == parent_id {
            return Err(cycle(child_id, "a part cannot be its own parent"));
        }

        let mut child = self.load_part(child_id).await?;
        let parent = self.load_part(parent_id).await?;

        self.ensure_not_ancestor(child.id, &parent).await?;

        self.store.set_part_parent(child.id, Some(parent.id)).await?;
        child.parent_part_id = Some(parent.id);

        info!(
            child_part_id = %child.id,
            parent_part_id = %parent.id,
            "Assembly link created"
        );
        Ok(child)
    }

    /// Detach `child_id` from its parent; a no-op for a root part
    pub async fn remove_parent(&self, child_id: Uuid) -> Result<Part> {
        let mut child = self.load_part(child_id).await?;
        if let Some(previous) = child.parent_part_id.take() {
            self.store.set_part_parent(child.id, None).await?;
            info!(
                child_part_id = %child.id,
                parent_part_id = %previous,
                "Assembly link removed"
            );
        }
        Ok(child)
    }

    /// Direct children of `part_id`, freshly queried on every call
    pub async fn children_of(&self, part_id: Uuid) -> Result<Vec<Part>> {
        let part = self.load_part(part_id).await?;
        Ok(self.store.list_child_parts(part.id).await?)
    }

    pub async fn dependency_status(&self, part_id: Uuid) -> Result<DependencyStatus> {
        let children = self.children_of(part_id).await?;

        let incomplete_children: Vec<IncompleteChild> = children
            .iter()
            .filter(|child| !child.status.satisfies_dependencies())
            .map(|child| IncompleteChild {
                id: child.id,
                part_number: child.part_number.clone(),
                status: child.status,
                reason: incomplete_reason(child),
            })
            .collect();

        Ok(DependencyStatus {
            has_children: !children.is_empty(),
            dependencies_met: incomplete_children.is_empty(),
            incomplete_children,
        })
    }

    /// All descendants of `part_id` in breadth-first order
    pub async fn assembly_tree(&self, part_id: Uuid) -> Result<Vec<AssemblyNode>> {
        let root = self.load_part(part_id).await?;
        let bound = self.store.count_parts().await?;

        let mut visited = HashSet::from([root.id]);
        let mut queue = VecDeque::from([(root.id, 0u32)]);
        let mut nodes = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            for child in self.store.list_child_parts(current).await? {
                if !visited.insert(child.id) {
                    warn!(
                        root_part_id = %root.id,
                        part_id = %child.id,
                        "Part reached twice during assembly traversal; skipping"
                    );
                    continue;
                }
                if visited.len() as u64 > bound {
                    warn!(root_part_id = %root.id, bound, "Assembly traversal exceeded part count");
                    return Ok(nodes);
                }
                queue.push_back((child.id, depth + 1));
                nodes.push(AssemblyNode {
                    part: child,
                    depth: depth + 1,
                });
            }
        }

        debug!(root_part_id = %root.id, descendants = nodes.len(), "Assembly tree built");
        Ok(nodes)
    }

    /// Walk up from `parent` and fail if `child_id` is one of its ancestors
    async fn ensure_not_ancestor(&self, child_id: Uuid, parent: &Part) -> Result<()> {
        let bound = self.store.count_parts().await?;
        let mut visited = HashSet::from([parent.id]);
        let mut next = parent.parent_part_id;
        let mut steps: u64 = 0;

        while let Some(ancestor_id) = next {
            if ancestor_id == child_id {
                return Err(cycle(
                    child_id,
                    format!("part {} is already a descendant of {child_id}", parent.id),
                ));
            }
            if !visited.insert(ancestor_id) {
                return Err(cycle(
                    ancestor_id,
                    format!("existing parent chain of part {} loops back on itself", parent.id),
                ));
            }
            steps += 1;
            if steps > bound {
                return Err(cycle(
                    parent.id,
                    format!("parent chain of part {} is longer than the {bound} known parts", parent.id),
                ));
            }

            next = match self.store.get_part(ancestor_id).await? {
                Some(ancestor) => ancestor.parent_part_id,
                None => None,
            };
        }
        Ok(())
    }

    async fn load_part(&self, part_id: Uuid) -> Result<Part> {
        self.store
            .get_part(part_id)
            .await?
            .ok_or_else(|| not_found("part", part_id))
    }
}

fn incomplete_reason(child: &Part) -> String {
    match child.status {
        PartStatus::NotStarted => format!("Part {} has not been started", child.part_number),
        PartStatus::InProgress => format!("Part {} is still in progress", child.part_number),
        PartStatus::Completed => format!("Part {} is completed", child.part_number),
    }
}
