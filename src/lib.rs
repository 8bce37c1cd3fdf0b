pub mod config;
pub mod logic;
pub mod models;

pub use config::GardenConfig;
pub use logic::router::{Command, Garden};
pub use models::{
    cell::{CellView, ChangeListener, PlantedView},
    garden::Direction,
    vegetable::{Ripeness, VegetableKind},
    Coordinate,
};
