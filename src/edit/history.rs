use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::ir::Entity;

/// Per-key attribute edits: `Some` sets the value, `None` removes the key.
pub type AttributeChanges = BTreeMap<String, Option<serde_json::Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Add,
    Reparent,
    Remove,
    AddSpouse,
    UpdateAttributes,
}

/// A replayable mutation of the entity list.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    Add {
        entity: Entity,
        parent_id: Option<String>,
    },
    Reparent {
        entity_id: String,
        new_parent_id: Option<String>,
    },
    Remove {
        entity_id: String,
    },
    AddSpouse {
        entity: Entity,
        existing_id: String,
    },
    UpdateAttributes {
        entity_id: String,
        changes: AttributeChanges,
    },
}

impl EditCommand {
    pub fn kind(&self) -> EditKind {
        match self {
            EditCommand::Add { .. } => EditKind::Add,
            EditCommand::Reparent { .. } => EditKind::Reparent,
            EditCommand::Remove { .. } => EditKind::Remove,
            EditCommand::AddSpouse { .. } => EditKind::AddSpouse,
            EditCommand::UpdateAttributes { .. } => EditKind::UpdateAttributes,
        }
    }

    /// Ids named by the command itself. Edits that ripple further (removal,
    /// reparenting) report the rest through [`EditAction::affected`].
    pub fn affected_ids(&self) -> Vec<String> {
        match self {
            EditCommand::Add { entity, parent_id } => {
                let mut ids = vec![entity.id.clone()];
                ids.extend(parent_id.iter().cloned());
                ids
            }
            EditCommand::Reparent {
                entity_id,
                new_parent_id,
            } => {
                let mut ids = vec![entity_id.clone()];
                ids.extend(new_parent_id.iter().cloned());
                ids
            }
            EditCommand::Remove { entity_id } => vec![entity_id.clone()],
            EditCommand::AddSpouse {
                entity,
                existing_id,
            } => vec![entity.id.clone(), existing_id.clone()],
            EditCommand::UpdateAttributes { entity_id, .. } => vec![entity_id.clone()],
        }
    }
}

/// What `undo` needs to put the entity list back.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoState {
    /// Deep copy of the whole list before a structural edit.
    Snapshot(Vec<Entity>),
    /// Previous values of the touched keys (`None` = key was absent).
    Attributes {
        entity_id: String,
        previous: AttributeChanges,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditAction {
    pub command: EditCommand,
    pub undo: UndoState,
    /// Every id whose record the edit changed, reported again on undo.
    pub affected: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl EditAction {
    pub fn new(command: EditCommand, undo: UndoState, affected: Vec<String>) -> Self {
        Self {
            command,
            undo,
            affected,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> EditKind {
        self.command.kind()
    }
}

/// Linear undo/redo stacks with a bounded undo depth.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<EditAction>,
    redo_stack: Vec<EditAction>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict();
    }

    /// Records a fresh edit; anything that was undone can no longer be redone.
    pub fn push(&mut self, action: EditAction) {
        self.redo_stack.clear();
        self.push_replayed(action);
    }

    /// Records an edit re-executed by redo, keeping the remaining redo entries.
    pub fn push_replayed(&mut self, action: EditAction) {
        tracing::trace!(kind = ?action.kind(), depth = self.undo_stack.len() + 1, "history push");
        self.undo_stack.push_back(action);
        self.evict();
    }

    fn evict(&mut self) {
        while self.undo_stack.len() > self.max_size {
            if let Some(dropped) = self.undo_stack.pop_front() {
                tracing::trace!(kind = ?dropped.kind(), "history full, evicting oldest action");
            }
        }
    }

    pub fn pop_undo(&mut self) -> Option<EditAction> {
        self.undo_stack.pop_back()
    }

    pub fn push_redo(&mut self, action: EditAction) {
        self.redo_stack.push(action);
    }

    pub fn pop_redo(&mut self) -> Option<EditAction> {
        self.redo_stack.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
