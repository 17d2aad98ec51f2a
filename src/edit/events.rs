use super::history::EditKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Reparented,
    Removed,
    SpouseAdded,
    AttributesUpdated,
    Undone(EditKind),
    Redone(EditKind),
    /// The whole document was swapped out.
    Replaced,
}

impl ChangeKind {
    pub fn from_edit(kind: EditKind) -> Self {
        match kind {
            EditKind::Add => ChangeKind::Added,
            EditKind::Reparent => ChangeKind::Reparented,
            EditKind::Remove => ChangeKind::Removed,
            EditKind::AddSpouse => ChangeKind::SpouseAdded,
            EditKind::UpdateAttributes => ChangeKind::AttributesUpdated,
        }
    }

    /// Whether positions may have changed, i.e. layout must run again.
    pub fn is_structural(self) -> bool {
        match self {
            ChangeKind::AttributesUpdated => false,
            ChangeKind::Undone(kind) | ChangeKind::Redone(kind) => {
                kind != EditKind::UpdateAttributes
            }
            _ => true,
        }
    }
}

/// Emitted by the edit model after every successful change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub revision: u64,
    pub kind: ChangeKind,
    pub ids: Vec<String>,
}

impl ChangeEvent {
    pub fn is_structural(&self) -> bool {
        self.kind.is_structural()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

type Callback = Box<dyn FnMut(&ChangeEvent) + Send>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Callback)>,
}

impl Listeners {
    pub fn add(&mut self, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn notify(&mut self, event: &ChangeEvent) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_changes_are_not_structural() {
        assert!(!ChangeKind::AttributesUpdated.is_structural());
        assert!(!ChangeKind::Undone(EditKind::UpdateAttributes).is_structural());
        assert!(ChangeKind::Redone(EditKind::Reparent).is_structural());
        assert!(ChangeKind::Replaced.is_structural());
    }

    #[test]
    fn removed_listener_is_not_called() {
        use std::sync::{Arc, Mutex};

        let hits = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::default();
        let counter = Arc::clone(&hits);
        let id = listeners.add(Box::new(move |_| *counter.lock().unwrap() += 1));
        let event = ChangeEvent {
            revision: 1,
            kind: ChangeKind::Added,
            ids: vec!["a".to_string()],
        };
        listeners.notify(&event);
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.notify(&event);
        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(listeners.len(), 0);
    }
}
