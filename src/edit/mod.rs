//! Consistency-preserving edits over the entity list, with linear undo/redo.
//!
//! The model owns one mutable `Vec<Entity>` and is not internally
//! synchronized; share it behind a mutex or a single owner task. Layout should
//! be computed from [`EditModel::snapshot`], never from a borrowed list that a
//! concurrent edit could change.

mod error;
pub mod events;
pub mod history;

pub use error::EditError;
pub use events::{ChangeEvent, ChangeKind, ListenerId};
pub use history::{AttributeChanges, EditAction, EditCommand, EditKind, History, UndoState};

use std::collections::{HashMap, HashSet};

use crate::config::EditConfig;
use crate::ir::{Entity, RESERVED_KEYS};
use events::Listeners;

#[derive(Debug)]
pub struct EditModel {
    entities: Vec<Entity>,
    history: History,
    listeners: Listeners,
    revision: u64,
}

impl Default for EditModel {
    fn default() -> Self {
        Self::new(Vec::new(), &EditConfig::default())
    }
}

impl EditModel {
    pub fn new(entities: Vec<Entity>, config: &EditConfig) -> Self {
        Self {
            entities,
            history: History::new(config.max_history_size),
            listeners: Listeners::default(),
            revision: 0,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Owned copy of the current list, for handing to a layout worker.
    pub fn snapshot(&self) -> Vec<Entity> {
        self.entities.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Bumped on every successful change, undo and redo included.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent) + Send + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Swaps in a new document and forgets all history.
    pub fn replace_all(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
        self.history.clear();
        let ids = self.entities.iter().map(|e| e.id.clone()).collect();
        self.emit(ChangeKind::Replaced, ids);
    }

    /// Appends `entity`, linking it under `parent_id` when that parent exists.
    /// Fails only when the id is already taken.
    pub fn add(&mut self, entity: Entity, parent_id: Option<&str>) -> Result<(), EditError> {
        self.apply(
            EditCommand::Add {
                entity,
                parent_id: parent_id.map(str::to_string),
            },
            true,
        )
    }

    pub fn reparent(&mut self, entity_id: &str, new_parent_id: Option<&str>) -> Result<(), EditError> {
        self.apply(
            EditCommand::Reparent {
                entity_id: entity_id.to_string(),
                new_parent_id: new_parent_id.map(str::to_string),
            },
            true,
        )
    }

    pub fn remove_member(&mut self, entity_id: &str) -> Result<(), EditError> {
        self.apply(
            EditCommand::Remove {
                entity_id: entity_id.to_string(),
            },
            true,
        )
    }

    pub fn add_spouse(&mut self, entity: Entity, existing_id: &str) -> Result<(), EditError> {
        self.apply(
            EditCommand::AddSpouse {
                entity,
                existing_id: existing_id.to_string(),
            },
            true,
        )
    }

    pub fn update_attributes(
        &mut self,
        entity_id: &str,
        changes: AttributeChanges,
    ) -> Result<(), EditError> {
        self.apply(
            EditCommand::UpdateAttributes {
                entity_id: entity_id.to_string(),
                changes,
            },
            true,
        )
    }

    /// Runs `command`. With `record == false` no history entry is created and
    /// the redo stack is left alone.
    pub fn apply(&mut self, command: EditCommand, record: bool) -> Result<(), EditError> {
        let (undo, ids) = match self.execute(&command) {
            Ok(applied) => applied,
            Err(err) => {
                tracing::warn!(error = %err, "edit rejected");
                return Err(err);
            }
        };
        let kind = command.kind();
        if record {
            self.history.push(EditAction::new(command, undo, ids.clone()));
        }
        self.emit(ChangeKind::from_edit(kind), ids);
        Ok(())
    }

    /// Reverts the most recent recorded edit. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.pop_undo() else {
            return false;
        };
        match &action.undo {
            UndoState::Snapshot(before) => self.entities = before.clone(),
            UndoState::Attributes {
                entity_id,
                previous,
            } => {
                if let Some(idx) = self.index_of(entity_id) {
                    self.write_attributes(idx, previous);
                }
            }
        }
        let kind = action.kind();
        let ids = action.affected.clone();
        self.history.push_redo(action);
        self.emit(ChangeKind::Undone(kind), ids);
        true
    }

    /// Re-executes the most recently undone edit. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.history.pop_redo() else {
            return false;
        };
        match self.execute(&action.command) {
            Ok((undo, ids)) => {
                let kind = action.kind();
                self.history
                    .push_replayed(EditAction::new(action.command, undo, ids.clone()));
                self.emit(ChangeKind::Redone(kind), ids);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "redo no longer applies, dropping it");
                false
            }
        }
    }

    fn emit(&mut self, kind: ChangeKind, ids: Vec<String>) {
        self.revision += 1;
        let event = ChangeEvent {
            revision: self.revision,
            kind,
            ids,
        };
        self.listeners.notify(&event);
    }

    /// Runs `command` and returns its undo state plus every id whose record
    /// changed.
    fn execute(&mut self, command: &EditCommand) -> Result<(UndoState, Vec<String>), EditError> {
        let ids = command.affected_ids();
        match command {
            EditCommand::Add { entity, parent_id } => {
                let before = self.entities.clone();
                self.add_entity(entity.clone(), parent_id.as_deref())?;
                Ok((UndoState::Snapshot(before), ids))
            }
            EditCommand::Reparent {
                entity_id,
                new_parent_id,
            } => {
                let before = self.entities.clone();
                let mut ids = ids;
                ids.extend(self.reparent_entity(entity_id, new_parent_id.as_deref())?);
                Ok((UndoState::Snapshot(before), ids))
            }
            EditCommand::Remove { entity_id } => {
                let before = self.entities.clone();
                let mut ids = ids;
                ids.extend(self.remove_entity(entity_id)?);
                Ok((UndoState::Snapshot(before), ids))
            }
            EditCommand::AddSpouse {
                entity,
                existing_id,
            } => {
                let before = self.entities.clone();
                self.add_spouse_entity(entity.clone(), existing_id)?;
                Ok((UndoState::Snapshot(before), ids))
            }
            EditCommand::UpdateAttributes { entity_id, changes } => {
                if let Some(key) = changes
                    .keys()
                    .find(|key| RESERVED_KEYS.contains(&key.as_str()))
                {
                    return Err(EditError::ReservedAttribute(key.clone()));
                }
                let idx = self
                    .index_of(entity_id)
                    .ok_or_else(|| EditError::UnknownEntity(entity_id.clone()))?;
                let current = &self.entities[idx].attributes;
                let previous = changes
                    .keys()
                    .map(|key| (key.clone(), current.get(key).cloned()))
                    .collect();
                self.write_attributes(idx, changes);
                let undo = UndoState::Attributes {
                    entity_id: entity_id.clone(),
                    previous,
                };
                Ok((undo, ids))
            }
        }
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    /// Swaps the record at `idx` for the one built by `update`.
    fn replace_with(&mut self, idx: usize, update: impl FnOnce(&Entity) -> Entity) {
        let next = update(&self.entities[idx]);
        self.entities[idx] = next;
    }

    fn write_attributes(&mut self, idx: usize, changes: &AttributeChanges) {
        self.replace_with(idx, |e| {
            let mut attributes = e.attributes.clone();
            for (key, value) in changes {
                match value {
                    Some(value) => {
                        attributes.insert(key.clone(), value.clone());
                    }
                    None => {
                        attributes.remove(key);
                    }
                }
            }
            Entity {
                attributes,
                ..e.clone()
            }
        });
    }

    fn ensure_unused(&self, id: &str) -> Result<(), EditError> {
        match self.index_of(id) {
            Some(_) => Err(EditError::DuplicateId(id.to_string())),
            None => Ok(()),
        }
    }

    fn add_entity(&mut self, entity: Entity, parent_id: Option<&str>) -> Result<(), EditError> {
        self.ensure_unused(&entity.id)?;
        let mut entity = entity;
        if let Some(parent_id) = parent_id {
            match self.index_of(parent_id) {
                Some(pidx) => {
                    let child_id = entity.id.clone();
                    self.replace_with(pidx, |p| Entity {
                        child_ids: appended(&p.child_ids, &child_id),
                        ..p.clone()
                    });
                    let parent_ids = appended(&entity.parent_ids, parent_id);
                    entity = Entity {
                        parent_ids,
                        ..entity
                    };
                }
                None => {
                    tracing::warn!(parent = parent_id, child = %entity.id, "parent not found, adding unlinked");
                }
            }
        }
        self.entities.push(entity);
        Ok(())
    }

    /// True when `candidate` is `entity_id` itself or has it somewhere in its
    /// ancestry. Every parent branch is followed; the visited set keeps
    /// already-cyclic data from looping.
    fn is_self_or_descendant(&self, entity_id: &str, candidate: &str) -> bool {
        let by_id: HashMap<&str, &Entity> =
            self.entities.iter().map(|e| (e.id.as_str(), e)).collect();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![candidate];
        while let Some(current) = stack.pop() {
            if current == entity_id {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(entity) = by_id.get(current) {
                stack.extend(entity.parent_ids.iter().map(String::as_str));
            }
        }
        false
    }

    /// Returns the former parents, whose child lists changed too.
    fn reparent_entity(
        &mut self,
        entity_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<Vec<String>, EditError> {
        let idx = self
            .index_of(entity_id)
            .ok_or_else(|| EditError::UnknownEntity(entity_id.to_string()))?;
        let new_generation = match new_parent_id {
            Some(parent_id) => {
                let pidx = self
                    .index_of(parent_id)
                    .ok_or_else(|| EditError::UnknownEntity(parent_id.to_string()))?;
                if self.is_self_or_descendant(entity_id, parent_id) {
                    return Err(EditError::Cycle {
                        entity: entity_id.to_string(),
                        parent: parent_id.to_string(),
                    });
                }
                let generation = self.entities[pidx]
                    .generation
                    .checked_add(1)
                    .ok_or_else(|| EditError::GenerationOverflow(parent_id.to_string()))?;
                Some(generation)
            }
            None => None,
        };

        let old_parents = self.entities[idx].parent_ids.clone();
        let mut detached_from = Vec::new();
        for old in &old_parents {
            if let Some(oidx) = self.index_of(old) {
                self.replace_with(oidx, |p| Entity {
                    child_ids: without(&p.child_ids, entity_id),
                    ..p.clone()
                });
                if Some(old.as_str()) != new_parent_id {
                    detached_from.push(old.clone());
                }
            }
        }

        self.replace_with(idx, |e| Entity {
            parent_ids: new_parent_id.map(str::to_string).into_iter().collect(),
            generation: new_generation.unwrap_or(e.generation),
            ..e.clone()
        });

        if let Some(parent_id) = new_parent_id
            && let Some(pidx) = self.index_of(parent_id)
        {
            self.replace_with(pidx, |p| Entity {
                child_ids: appended(&p.child_ids, entity_id),
                ..p.clone()
            });
        }
        Ok(detached_from)
    }

    /// Removes `entity_id` and sweeps every reference to it.
    ///
    /// Children of the removed entity are handed to its first surviving
    /// spouse (spouse links are read in both directions), so removing one
    /// parent of a couple never orphans the children. Returns the ids of the
    /// surviving records that changed.
    fn remove_entity(&mut self, entity_id: &str) -> Result<Vec<String>, EditError> {
        let idx = self
            .index_of(entity_id)
            .ok_or_else(|| EditError::UnknownEntity(entity_id.to_string()))?;
        let removed = &self.entities[idx];

        let present: HashSet<&str> = self.entities.iter().map(|e| e.id.as_str()).collect();
        let mut spouses: Vec<String> = Vec::new();
        for spouse in &removed.spouse_ids {
            if spouse != entity_id && present.contains(spouse.as_str()) && !spouses.contains(spouse) {
                spouses.push(spouse.clone());
            }
        }
        for other in &self.entities {
            if other.id != entity_id && other.has_spouse(entity_id) && !spouses.contains(&other.id) {
                spouses.push(other.id.clone());
            }
        }
        let heir = spouses.into_iter().next();

        let mut adopted: Vec<String> = Vec::new();
        let mut touched: Vec<String> = Vec::new();
        let mut next: Vec<Entity> = Vec::with_capacity(self.entities.len().saturating_sub(1));
        for entity in &self.entities {
            if entity.id == entity_id {
                continue;
            }
            let mut parent_ids = without(&entity.parent_ids, entity_id);
            if entity.has_parent(entity_id)
                && let Some(heir) = &heir
                && heir != &entity.id
                && !parent_ids.contains(heir)
            {
                parent_ids.push(heir.clone());
                adopted.push(entity.id.clone());
            }
            let updated = Entity {
                parent_ids,
                spouse_ids: without(&entity.spouse_ids, entity_id),
                child_ids: without(&entity.child_ids, entity_id),
                ..entity.clone()
            };
            if updated != *entity {
                touched.push(entity.id.clone());
            }
            next.push(updated);
        }
        self.entities = next;

        if let Some(heir) = &heir
            && !adopted.is_empty()
            && let Some(hidx) = self.index_of(heir)
        {
            self.replace_with(hidx, |h| {
                let mut child_ids = h.child_ids.clone();
                for child in &adopted {
                    if !child_ids.contains(child) {
                        child_ids.push(child.clone());
                    }
                }
                Entity {
                    child_ids,
                    ..h.clone()
                }
            });
            if !touched.contains(heir) {
                touched.push(heir.clone());
            }
        }
        tracing::debug!(removed = entity_id, heir = ?heir, adopted = adopted.len(), "member removed");
        Ok(touched)
    }

    fn add_spouse_entity(&mut self, entity: Entity, existing_id: &str) -> Result<(), EditError> {
        self.ensure_unused(&entity.id)?;
        let eidx = self
            .index_of(existing_id)
            .ok_or_else(|| EditError::UnknownEntity(existing_id.to_string()))?;
        let generation = self.entities[eidx].generation;
        let new_id = entity.id.clone();
        self.replace_with(eidx, |e| Entity {
            spouse_ids: appended(&e.spouse_ids, &new_id),
            ..e.clone()
        });
        self.entities.push(Entity {
            spouse_ids: vec![existing_id.to_string()],
            generation,
            ..entity
        });
        Ok(())
    }
}

fn appended(ids: &[String], id: &str) -> Vec<String> {
    let mut next = ids.to_vec();
    if !next.iter().any(|existing| existing == id) {
        next.push(id.to_string());
    }
    next
}

fn without(ids: &[String], id: &str) -> Vec<String> {
    ids.iter().filter(|existing| *existing != id).cloned().collect()
}

#[cfg(test)]
mod tests;
