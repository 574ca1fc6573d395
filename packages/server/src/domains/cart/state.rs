use serde::Serialize;

use crate::common::{EventId, WorkshopId};
use crate::domains::combo::{validate_selection, SelectedCombo, SelectionError};

/// One event line in a cart. The fee is captured at add time so later
/// catalog edits do not silently reprice a cart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartEventEntry {
    pub event_id: EventId,
    pub title: String,
    pub tag: String,
    pub department: String,
    pub fee: i64,
}

/// One workshop line in a cart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartWorkshopEntry {
    pub workshop_id: WorkshopId,
    pub title: String,
    pub price: i64,
}

/// Outcome of a removal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub removed: bool,
    pub combo_cleared: bool,
}

/// Authoritative cart contents for one member.
///
/// All transitions here are pure and synchronous; persistence lives in the
/// models layer and handlers answer with a freshly loaded snapshot after
/// every mutation. Invariants:
/// - at most one entry per event/workshop id,
/// - an active combo whose rules no longer hold is cleared, never kept
///   silently violated.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartSnapshot {
    pub events: Vec<CartEventEntry>,
    pub workshops: Vec<CartWorkshopEntry>,
    pub active_combo: Option<SelectedCombo>,
}

impl CartSnapshot {
    /// Append an event unless one with the same id is already present.
    /// Returns false on the duplicate no-op.
    pub fn add_event(&mut self, entry: CartEventEntry) -> bool {
        if self.events.iter().any(|e| e.event_id == entry.event_id) {
            return false;
        }
        self.events.push(entry);
        self.revalidate_combo();
        true
    }

    /// Append a workshop unless one with the same id is already present.
    pub fn add_workshop(&mut self, entry: CartWorkshopEntry) -> bool {
        if self
            .workshops
            .iter()
            .any(|w| w.workshop_id == entry.workshop_id)
        {
            return false;
        }
        self.workshops.push(entry);
        self.revalidate_combo();
        true
    }

    pub fn remove_event(&mut self, id: EventId) -> RemovalOutcome {
        let before = self.events.len();
        self.events.retain(|e| e.event_id != id);
        let removed = self.events.len() != before;
        let combo_cleared = removed && self.revalidate_combo();
        RemovalOutcome {
            removed,
            combo_cleared,
        }
    }

    pub fn remove_workshop(&mut self, id: WorkshopId) -> RemovalOutcome {
        let before = self.workshops.len();
        self.workshops.retain(|w| w.workshop_id != id);
        let removed = self.workshops.len() != before;
        let combo_cleared = removed && self.revalidate_combo();
        RemovalOutcome {
            removed,
            combo_cleared,
        }
    }

    /// Apply a package selection, rejecting one whose rules fail against
    /// the current contents.
    pub fn select_combo(&mut self, combo: SelectedCombo) -> Result<(), SelectionError> {
        validate_selection(combo.kind, self.events.len(), self.workshops.len())?;
        self.active_combo = Some(combo);
        Ok(())
    }

    /// Drop the active combo when its rules no longer hold. Returns true
    /// when a combo was cleared.
    pub fn revalidate_combo(&mut self) -> bool {
        let Some(combo) = &self.active_combo else {
            return false;
        };
        if validate_selection(combo.kind, self.events.len(), self.workshops.len()).is_ok() {
            return false;
        }
        self.active_combo = None;
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.workshops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::combo::{ComboKind, ComboPackage};
    use crate::domains::member::Affiliation;

    fn event(id: EventId) -> CartEventEntry {
        CartEventEntry {
            event_id: id,
            title: "Robowars".to_string(),
            tag: "flagship".to_string(),
            department: "Mechanical".to_string(),
            fee: 500,
        }
    }

    fn workshop(id: WorkshopId) -> CartWorkshopEntry {
        CartWorkshopEntry {
            workshop_id: id,
            title: "Rust for Embedded".to_string(),
            price: 350,
        }
    }

    fn combo(slug: &str) -> SelectedCombo {
        SelectedCombo::from_package(ComboPackage::find(slug).unwrap(), Affiliation::Host)
    }

    #[test]
    fn duplicate_event_add_is_a_noop() {
        let mut cart = CartSnapshot::default();
        let id = EventId::new();
        assert!(cart.add_event(event(id)));
        assert!(!cart.add_event(event(id)));
        assert_eq!(cart.events.len(), 1);
    }

    #[test]
    fn duplicate_workshop_add_is_a_noop() {
        let mut cart = CartSnapshot::default();
        let id = WorkshopId::new();
        assert!(cart.add_workshop(workshop(id)));
        assert!(!cart.add_workshop(workshop(id)));
        assert_eq!(cart.workshops.len(), 1);
    }

    #[test]
    fn removing_the_only_workshop_clears_workshop_combo() {
        let mut cart = CartSnapshot::default();
        let id = WorkshopId::new();
        cart.add_workshop(workshop(id));
        cart.select_combo(combo("single-workshop")).unwrap();

        let outcome = cart.remove_workshop(id);
        assert!(outcome.removed);
        assert!(outcome.combo_cleared);
        assert!(cart.active_combo.is_none());
    }

    #[test]
    fn removing_an_event_keeps_a_still_valid_combo() {
        let mut cart = CartSnapshot::default();
        let first = EventId::new();
        let second = EventId::new();
        cart.add_event(event(first));
        cart.add_event(event(second));
        cart.select_combo(combo("all-events")).unwrap();

        let outcome = cart.remove_event(first);
        assert!(outcome.removed);
        assert!(!outcome.combo_cleared);
        assert_eq!(
            cart.active_combo.as_ref().map(|c| c.kind),
            Some(ComboKind::AllEvents)
        );
    }

    #[test]
    fn adding_a_workshop_invalidates_events_only_combo() {
        let mut cart = CartSnapshot::default();
        cart.add_event(event(EventId::new()));
        cart.select_combo(combo("all-events")).unwrap();

        cart.add_workshop(workshop(WorkshopId::new()));
        assert!(cart.active_combo.is_none());
    }

    #[test]
    fn select_combo_rejects_rule_violation() {
        let mut cart = CartSnapshot::default();
        cart.add_event(event(EventId::new()));
        let err = cart.select_combo(combo("single-workshop")).unwrap_err();
        assert_eq!(err, SelectionError::NeedsExactlyOneWorkshop);
        assert!(cart.active_combo.is_none());
    }

    #[test]
    fn removing_a_missing_id_changes_nothing() {
        let mut cart = CartSnapshot::default();
        cart.add_event(event(EventId::new()));
        let outcome = cart.remove_event(EventId::new());
        assert!(!outcome.removed);
        assert!(!outcome.combo_cleared);
        assert_eq!(cart.events.len(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut cart = CartSnapshot::default();
        cart.add_workshop(workshop(WorkshopId::new()));
        cart.select_combo(combo("single-workshop")).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.active_combo.is_none());
    }
}
