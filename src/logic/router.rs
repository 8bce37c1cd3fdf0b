use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::config::GardenConfig;
use crate::logic::scheduler::RipenessScheduler;
use crate::models::{
    cell::{CellView, ChangeListener, Harvested},
    garden::{Direction, GardenGrid},
    vegetable::{Vegetable, VegetableKind},
    Coordinate,
};

/// Player commands. Every command targets the cell under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveCursor(Direction),
    /// `(col, row)`; out-of-range values are clamped into the grid.
    MoveCursorTo(i64, i64),
    Plant(VegetableKind),
    ApplyFertilizer,
    ApplyGrass,
    Harvest,
}

impl Command {
    /// Key binding of the demo: arrows move, `G` grass, `F` fertilizer,
    /// `C` carrot, `T` turnip, `R` harvest.
    pub fn from_key(key: &str) -> Option<Self> {
        let command = match key.trim().to_ascii_lowercase().as_str() {
            "up" => Command::MoveCursor(Direction::Up),
            "down" => Command::MoveCursor(Direction::Down),
            "left" => Command::MoveCursor(Direction::Left),
            "right" => Command::MoveCursor(Direction::Right),
            "g" => Command::ApplyGrass,
            "f" => Command::ApplyFertilizer,
            "c" => Command::Plant(VegetableKind::Carrot),
            "t" => Command::Plant(VegetableKind::Turnip),
            "r" => Command::Harvest,
            _ => return None,
        };
        Some(command)
    }

    /// Pointer click at pixel `(x, y)` on a field drawn with square cells of
    /// `cell_size` pixels.
    pub fn from_click(x: f64, y: f64, cell_size: f64) -> Option<Self> {
        if cell_size.is_nan() || cell_size <= 0.0 {
            return None;
        }
        Some(Command::MoveCursorTo(
            (x / cell_size).floor() as i64,
            (y / cell_size).floor() as i64,
        ))
    }
}

/// The garden as seen by input adapters: grid, cursor and ripening scheduler
/// behind a single `dispatch` entry point.
pub struct Garden {
    grid: GardenGrid,
    scheduler: RipenessScheduler,
}

impl Garden {
    /// Ripening tasks are spawned on `runtime`.
    pub fn new(config: &GardenConfig, runtime: Handle) -> Self {
        Self {
            grid: GardenGrid::new(config.cols, config.rows),
            scheduler: RipenessScheduler::new(config.ripening_delay(), runtime),
        }
    }

    pub fn grid(&self) -> &GardenGrid {
        &self.grid
    }

    pub fn scheduler(&self) -> &RipenessScheduler {
        &self.scheduler
    }

    pub fn cursor(&self) -> Coordinate {
        self.grid.cursor()
    }

    pub fn current_view(&self) -> CellView {
        self.grid.cursor_cell().lock().view()
    }

    /// Registers `listener` on one cell. Returns `false` for unknown coordinates.
    pub fn subscribe(&self, at: Coordinate, listener: ChangeListener) -> bool {
        match self.grid.cell(at) {
            Some(cell) => {
                cell.lock().on_change(listener);
                true
            }
            None => false,
        }
    }

    pub fn subscribe_all(&self, listener: ChangeListener) {
        for at in self.grid.coordinates() {
            self.subscribe(at, listener.clone());
        }
    }

    /// Applies `command` at the cursor. Returns whether anything changed.
    pub fn dispatch(&mut self, command: Command) -> bool {
        log::debug!("{command:?} at {}", self.grid.cursor());
        match command {
            Command::MoveCursor(direction) => self.grid.move_cursor(direction),
            Command::MoveCursorTo(col, row) => self.grid.move_cursor_to(col, row),
            Command::Plant(kind) => {
                self.grid.cursor_cell().lock().plant(Vegetable::new(kind));
                true
            }
            Command::ApplyFertilizer => {
                let cells = self.grid.downgrade();
                let mut cell = self.grid.cursor_cell().lock();
                cell.apply_fertilizer();
                self.scheduler.arm(cells, &cell);
                true
            }
            Command::ApplyGrass => {
                self.grid.cursor_cell().lock().apply_grass();
                true
            }
            Command::Harvest => {
                let mut cell = self.grid.cursor_cell().lock();
                match cell.harvest() {
                    None => false,
                    Some(Harvested::Vegetable(vegetable)) => {
                        self.scheduler.cancel(cell.coordinate(), vegetable.id());
                        true
                    }
                    Some(Harvested::Fertilizer | Harvested::Grass) => true,
                }
            }
        }
    }
}
