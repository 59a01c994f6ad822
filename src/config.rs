//! Run configuration and the standard floor layout.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{WarehouseError, WarehouseResult};
use crate::events::LineObserver;
use crate::factory::ShapeFactory;
use crate::storage::Storage;
use crate::types::{Position, Shape, VehicleId};
use crate::vehicle::{Agvs, VehicleSpec};
use crate::warehouse::{DrainPolicy, Warehouse};

pub const PICKING_POINT: Position = Position::new(3, 2);
pub const DEPOT: Position = Position::new(3, 3);

/// Storage name, position, and the shape it receives.
pub const STORAGES: [(&str, Position, Shape); 3] = [
    ("CYLINDRICAL", Position::new(0, 1), Shape::Cylindrical),
    ("SQUARE", Position::new(0, 2), Shape::Square),
    ("ROUND", Position::new(0, 3), Shape::Round),
];

#[derive(Clone, Debug)]
pub struct LineConfig {
    pub vehicles: usize,
    pub pieces: usize,
    pub max_battery: u32,
    pub move_cost: u32,
    pub move_time_ms: u64,
    pub seed: u64,
    pub policy: DrainPolicy,
}

impl Default for LineConfig {
    fn default() -> Self {
        let spec = VehicleSpec::default();
        Self {
            vehicles: 3,
            pieces: 10,
            max_battery: spec.max_battery,
            move_cost: spec.move_cost,
            move_time_ms: 0,
            seed: 2432,
            policy: DrainPolicy::default(),
        }
    }
}

impl LineConfig {
    pub fn validate(&self) -> WarehouseResult<()> {
        if self.vehicles == 0 {
            return Err(WarehouseError::Config("vehicles must be > 0".to_string()));
        }
        if self.pieces == 0 {
            return Err(WarehouseError::Config("pieces must be > 0".to_string()));
        }
        if self.move_cost == 0 {
            return Err(WarehouseError::Config("move_cost must be > 0".to_string()));
        }
        if self.max_battery < self.move_cost {
            return Err(WarehouseError::Config(format!(
                "max_battery {} cannot pay for a single move costing {}",
                self.max_battery, self.move_cost
            )));
        }
        Ok(())
    }

    pub fn vehicle_spec(&self) -> VehicleSpec {
        VehicleSpec {
            max_battery: self.max_battery,
            move_cost: self.move_cost,
            move_time: Duration::from_millis(self.move_time_ms),
        }
    }

    /// Warehouse with the three standard storages and an empty, open conveyor.
    pub fn build_warehouse(&self, observer: Arc<dyn LineObserver>) -> Warehouse {
        let mut warehouse = Warehouse::new(PICKING_POINT, self.policy, observer);
        for (name, position, _) in STORAGES {
            warehouse = warehouse.with_storage(name, position);
        }
        warehouse
    }

    /// One factory per standard storage.
    pub fn shape_factories(&self) -> Vec<ShapeFactory> {
        STORAGES
            .iter()
            .map(|(_, position, shape)| ShapeFactory::new(*shape, *position))
            .collect()
    }

    /// Depot holding `vehicles` fully charged vehicles, numbered from 1.
    pub fn build_depot(&self) -> Storage<Agvs> {
        let mut depot = Storage::new(DEPOT);
        let spec = self.vehicle_spec();
        for id in 1..=self.vehicles as VehicleId {
            depot.store(Agvs::new(id, DEPOT, spec));
        }
        depot
    }
}
