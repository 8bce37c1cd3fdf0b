use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_VEGETABLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum VegetableKind {
    Carrot,
    Turnip,
}

impl VegetableKind {
    pub const ALL: [VegetableKind; 2] = [VegetableKind::Carrot, VegetableKind::Turnip];

    /// Lowercase label used by presentation layers to pick a sprite or style.
    pub fn label(&self) -> &'static str {
        match self {
            VegetableKind::Carrot => "carrot",
            VegetableKind::Turnip => "turnip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Ripeness {
    #[default]
    Raw,
    Ripe,
}

/// Process-unique identity of a planted vegetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VegetableId(u64);

/// One planted crop. The kind and identity never change; only ripeness does.
#[derive(Debug, Clone, PartialEq)]
pub struct Vegetable {
    id: VegetableId,
    kind: VegetableKind,
    ripeness: Ripeness,
}

impl Vegetable {
    pub fn new(kind: VegetableKind) -> Self {
        Self {
            id: VegetableId(NEXT_VEGETABLE_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            ripeness: Ripeness::Raw,
        }
    }

    pub fn id(&self) -> VegetableId {
        self.id
    }

    pub fn kind(&self) -> VegetableKind {
        self.kind
    }

    pub fn ripeness(&self) -> Ripeness {
        self.ripeness
    }

    pub fn is_ripe(&self) -> bool {
        self.ripeness == Ripeness::Ripe
    }

    /// Raw → Ripe. Returns whether the state actually changed.
    pub fn ripen(&mut self) -> bool {
        if self.is_ripe() {
            return false;
        }
        self.ripeness = Ripeness::Ripe;
        true
    }
}
