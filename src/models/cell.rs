use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::models::{
    vegetable::{Ripeness, Vegetable, VegetableId, VegetableKind},
    Coordinate,
};

/// Observer invoked synchronously after every mutation of a cell.
///
/// Listeners run while the cell is locked: they must read the snapshot they
/// are handed and never call back into the garden.
pub type ChangeListener = Arc<dyn Fn(Coordinate, &CellView) + Send + Sync>;

/// The visible vegetable of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantedView {
    pub kind: VegetableKind,
    pub ripeness: Ripeness,
}

/// Read-only snapshot of what a presentation layer needs to draw one cell.
#[skip_serializing_none]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub vegetable: Option<PlantedView>,
    pub fertilizer_active: bool,
    pub grass_active: bool,
}

/// What a single `harvest` call removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Harvested {
    Vegetable(Vegetable),
    Fertilizer,
    Grass,
}

pub struct Cell {
    coordinate: Coordinate,
    /// Planting stack: the last element is the current vegetable.
    vegetables: Vec<Vegetable>,
    fertilizer_active: bool,
    grass_active: bool,
    listeners: Vec<ChangeListener>,
}

impl Cell {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            vegetables: Vec::new(),
            fertilizer_active: false,
            grass_active: false,
            listeners: Vec::new(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn vegetables(&self) -> &[Vegetable] {
        &self.vegetables
    }

    pub fn current_vegetable(&self) -> Option<&Vegetable> {
        self.vegetables.last()
    }

    pub fn is_fertilizer_active(&self) -> bool {
        self.fertilizer_active
    }

    pub fn is_grass_active(&self) -> bool {
        self.grass_active
    }

    pub fn view(&self) -> CellView {
        CellView {
            vegetable: self.current_vegetable().map(|v| PlantedView {
                kind: v.kind(),
                ripeness: v.ripeness(),
            }),
            fertilizer_active: self.fertilizer_active,
            grass_active: self.grass_active,
        }
    }

    pub fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    pub fn plant(&mut self, vegetable: Vegetable) {
        self.vegetables.push(vegetable);
        self.changed();
    }

    /// Sets the flag only; arming a ripening task is the router's job.
    pub fn apply_fertilizer(&mut self) {
        self.fertilizer_active = true;
        self.changed();
    }

    pub fn apply_grass(&mut self) {
        self.grass_active = true;
        self.changed();
    }

    /// Removes one layer, most recent first: the top vegetable, then the
    /// fertilizer, then the grass. Returns `None` (and notifies nobody) when
    /// the cell is already bare.
    pub fn harvest(&mut self) -> Option<Harvested> {
        let harvested = if let Some(vegetable) = self.vegetables.pop() {
            Harvested::Vegetable(vegetable)
        } else if self.fertilizer_active {
            self.fertilizer_active = false;
            Harvested::Fertilizer
        } else if self.grass_active {
            self.grass_active = false;
            Harvested::Grass
        } else {
            return None;
        };
        self.changed();
        Some(harvested)
    }

    /// Completion of a ripening task: ripens the vegetable captured when the
    /// task was armed (wherever it sits in the stack now) and consumes the
    /// fertilizer, as a single change.
    pub fn finish_ripening(&mut self, target: VegetableId) -> bool {
        let ripened = self
            .vegetables
            .iter_mut()
            .find(|v| v.id() == target)
            .map(Vegetable::ripen)
            .unwrap_or(false);
        self.fertilizer_active = false;
        self.changed();
        ripened
    }

    /// Edge-triggered: every call delivers one notification, nothing stays dirty.
    fn changed(&self) {
        if self.listeners.is_empty() {
            return;
        }
        let view = self.view();
        for listener in &self.listeners {
            listener(self.coordinate, &view);
        }
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("coordinate", &self.coordinate)
            .field("vegetables", &self.vegetables)
            .field("fertilizer_active", &self.fertilizer_active)
            .field("grass_active", &self.grass_active)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_cell() -> (Cell, Arc<AtomicUsize>) {
        let mut cell = Cell::new(Coordinate::new(0, 0));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        cell.on_change(Arc::new(move |_: Coordinate, _: &CellView| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        (cell, count)
    }

    #[test]
    fn test_plant_appends_and_last_is_current() {
        let mut cell = Cell::new(Coordinate::new(1, 2));
        cell.plant(Vegetable::new(VegetableKind::Carrot));
        cell.plant(Vegetable::new(VegetableKind::Turnip));
        assert_eq!(cell.vegetables().len(), 2);
        assert_eq!(
            cell.current_vegetable().map(Vegetable::kind),
            Some(VegetableKind::Turnip),
            "The last planted vegetable must be current"
        );
    }

    #[test]
    fn test_harvest_order_vegetables_then_fertilizer_then_grass() {
        let mut cell = Cell::new(Coordinate::new(0, 0));
        cell.apply_grass();
        cell.apply_fertilizer();
        cell.plant(Vegetable::new(VegetableKind::Carrot));
        cell.plant(Vegetable::new(VegetableKind::Turnip));

        let kinds: Vec<String> = std::iter::from_fn(|| cell.harvest())
            .map(|h| match h {
                Harvested::Vegetable(v) => v.kind().label().to_string(),
                Harvested::Fertilizer => "fertilizer".into(),
                Harvested::Grass => "grass".into(),
            })
            .collect();
        assert_eq!(kinds, vec!["turnip", "carrot", "fertilizer", "grass"]);
        assert!(cell.harvest().is_none(), "A bare cell must stay bare");
    }

    #[test]
    fn test_fertilizer_survives_until_vegetables_are_gone() {
        let mut cell = Cell::new(Coordinate::new(0, 0));
        cell.apply_fertilizer();
        cell.plant(Vegetable::new(VegetableKind::Carrot));
        cell.harvest();
        assert!(cell.is_fertilizer_active());
        assert_eq!(cell.harvest(), Some(Harvested::Fertilizer));
        assert!(!cell.is_fertilizer_active());
    }

    #[test]
    fn test_notification_once_per_mutation() {
        let (mut cell, count) = counted_cell();
        cell.plant(Vegetable::new(VegetableKind::Carrot));
        cell.apply_fertilizer();
        cell.apply_grass();
        assert_eq!(count.load(Ordering::SeqCst), 3);
        cell.harvest();
        cell.harvest();
        cell.harvest();
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_noop_harvest_does_not_notify() {
        let (mut cell, count) = counted_cell();
        assert!(cell.harvest().is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0, "Bare harvest must be silent");
    }

    #[test]
    fn test_finish_ripening_targets_captured_vegetable() {
        let mut cell = Cell::new(Coordinate::new(0, 0));
        let carrot = Vegetable::new(VegetableKind::Carrot);
        let target = carrot.id();
        cell.plant(carrot);
        cell.apply_fertilizer();
        cell.plant(Vegetable::new(VegetableKind::Turnip));

        assert!(cell.finish_ripening(target));
        assert!(!cell.is_fertilizer_active());
        assert_eq!(cell.current_vegetable().map(Vegetable::ripeness), Some(Ripeness::Raw));
        assert_eq!(cell.vegetables()[0].ripeness(), Ripeness::Ripe);
    }

    #[test]
    fn test_view_reflects_state() {
        let mut cell = Cell::new(Coordinate::new(0, 0));
        assert_eq!(cell.view(), CellView::default());
        cell.plant(Vegetable::new(VegetableKind::Turnip));
        cell.apply_grass();
        let view = cell.view();
        assert_eq!(
            view.vegetable,
            Some(PlantedView { kind: VegetableKind::Turnip, ripeness: Ripeness::Raw })
        );
        assert!(view.grass_active);
        assert!(!view.fertilizer_active);
    }

    #[test]
    fn test_view_serialization_skips_empty_vegetable() {
        let json = serde_json::to_value(CellView::default()).unwrap();
        assert!(json.get("vegetable").is_none());
        assert_eq!(json["fertilizerActive"], false);
    }
}
