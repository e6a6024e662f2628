//! The landscape: a grid of hexagonal cells, each with a carrying capacity,
//! a position, up to six neighbours and membership in a super-region whose
//! resistance values govern whether dispersing animals cross its boundary.
mod loader;
mod path;

pub use loader::{CsvLandscapeLoader, LandscapeFiles, LandscapeLoader};

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::RabiesError;
use crate::hashing::{HashMap, HashMapExt};

/// Index of a cell in its `Landscape`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub usize);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a super-region in its `Landscape`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SuperRegionId(pub usize);

/// The six headings of a hexagonal grid, in clockwise order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Direction {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Direction {
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The heading at `index` modulo 6.
    #[must_use]
    pub fn from_index(index: usize) -> Direction {
        match index % 6 {
            0 => Direction::North,
            1 => Direction::NorthEast,
            2 => Direction::SouthEast,
            3 => Direction::South,
            4 => Direction::SouthWest,
            _ => Direction::NorthWest,
        }
    }

    /// The heading `steps` sixths of a turn clockwise (negative for
    /// counter-clockwise).
    #[must_use]
    pub fn rotate(self, steps: i32) -> Direction {
        let index = (i32::try_from(self.index()).unwrap_or(0) + steps).rem_euclid(6);
        Direction::from_index(usize::try_from(index).unwrap_or(0))
    }

    #[must_use]
    pub fn opposite(self) -> Direction {
        self.rotate(3)
    }
}

/// A grouping of cells that share boundary resistance. Resistances are
/// percentages: the chance (0-100) that a dispersing animal is stopped when
/// leaving (outbound) or entering (inbound) the region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuperRegion {
    pub key: String,
    pub inbound_resistance: u32,
    pub outbound_resistance: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    key: String,
    carrying_capacity: f64,
    x: f64,
    y: f64,
    neighbors: [Option<CellId>; 6],
    super_region: SuperRegionId,
}

impl Cell {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn carrying_capacity(&self) -> f64 {
        self.carrying_capacity
    }

    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    #[must_use]
    pub fn neighbor(&self, direction: Direction) -> Option<CellId> {
        self.neighbors[direction.index()]
    }

    #[must_use]
    pub fn super_region(&self) -> SuperRegionId {
        self.super_region
    }
}

/// One cell as it appears in an external source: neighbours and the
/// super-region are referenced by key. Neighbour keys that are empty or
/// `"none"` mean there is no neighbour in that direction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub key: String,
    pub carrying_capacity: f64,
    pub x: f64,
    pub y: f64,
    pub north: Option<String>,
    pub north_east: Option<String>,
    pub south_east: Option<String>,
    pub south: Option<String>,
    pub south_west: Option<String>,
    pub north_west: Option<String>,
    pub super_region: String,
}

impl CellRecord {
    fn neighbor_key(&self, direction: Direction) -> Option<&str> {
        let key = match direction {
            Direction::North => &self.north,
            Direction::NorthEast => &self.north_east,
            Direction::SouthEast => &self.south_east,
            Direction::South => &self.south,
            Direction::SouthWest => &self.south_west,
            Direction::NorthWest => &self.north_west,
        };
        key.as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.eq_ignore_ascii_case("none"))
    }
}

#[derive(Clone, Debug)]
pub struct Landscape {
    cells: Vec<Cell>,
    super_regions: Vec<SuperRegion>,
    cell_index: HashMap<String, CellId>,
}

impl Landscape {
    /// Builds the graph from cell and super-region records, resolving keys.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::ConfigError` for duplicate keys, negative
    /// carrying capacities, resistances above 100, dangling neighbour
    /// references and unknown super-regions.
    pub fn new(
        cell_records: Vec<CellRecord>,
        super_regions: Vec<SuperRegion>,
    ) -> Result<Landscape, RabiesError> {
        let mut region_index = HashMap::new();
        for (i, region) in super_regions.iter().enumerate() {
            if region.inbound_resistance > 100 || region.outbound_resistance > 100 {
                return Err(RabiesError::ConfigError(format!(
                    "super-region {} has a resistance above 100",
                    region.key
                )));
            }
            if region_index
                .insert(region.key.clone(), SuperRegionId(i))
                .is_some()
            {
                return Err(RabiesError::ConfigError(format!(
                    "duplicate super-region {}",
                    region.key
                )));
            }
        }

        let mut cell_index = HashMap::new();
        for (i, record) in cell_records.iter().enumerate() {
            if cell_index.insert(record.key.clone(), CellId(i)).is_some() {
                return Err(RabiesError::ConfigError(format!(
                    "duplicate cell {}",
                    record.key
                )));
            }
        }

        let mut cells = Vec::with_capacity(cell_records.len());
        for record in &cell_records {
            if !record.carrying_capacity.is_finite() || record.carrying_capacity < 0.0 {
                return Err(RabiesError::ConfigError(format!(
                    "cell {} has invalid carrying capacity {}",
                    record.key, record.carrying_capacity
                )));
            }
            let super_region = *region_index.get(&record.super_region).ok_or_else(|| {
                RabiesError::ConfigError(format!(
                    "cell {} belongs to unknown super-region {}",
                    record.key, record.super_region
                ))
            })?;
            let mut neighbors = [None; 6];
            for direction in Direction::iter() {
                if let Some(key) = record.neighbor_key(direction) {
                    let id = cell_index.get(key).ok_or_else(|| {
                        RabiesError::ConfigError(format!(
                            "cell {} has unknown {direction} neighbour {key}",
                            record.key
                        ))
                    })?;
                    neighbors[direction.index()] = Some(*id);
                }
            }
            cells.push(Cell {
                key: record.key.clone(),
                carrying_capacity: record.carrying_capacity,
                x: record.x,
                y: record.y,
                neighbors,
                super_region,
            });
        }

        let landscape = Landscape {
            cells,
            super_regions,
            cell_index,
        };
        landscape.warn_on_one_way_links();
        Ok(landscape)
    }

    // A link A -> B in direction d is expected to be mirrored by B -> A in
    // the opposite direction. One-way links are legal but usually a data
    // error.
    fn warn_on_one_way_links(&self) {
        for (i, cell) in self.cells.iter().enumerate() {
            for direction in Direction::iter() {
                if let Some(neighbor) = cell.neighbor(direction) {
                    if self.cells[neighbor.0].neighbor(direction.opposite()) != Some(CellId(i)) {
                        warn!(
                            "cell {} links {direction} to {} but the link is not mirrored",
                            cell.key, self.cells[neighbor.0].key
                        );
                    }
                }
            }
        }
    }

    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if the id is not in this
    /// landscape.
    pub fn cell(&self, id: CellId) -> Result<&Cell, RabiesError> {
        self.cells
            .get(id.0)
            .ok_or_else(|| RabiesError::MissingReference(format!("no cell with id {id}")))
    }

    #[must_use]
    pub fn cell_id(&self, key: &str) -> Option<CellId> {
        self.cell_index.get(key).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter().enumerate().map(|(i, cell)| (CellId(i), cell))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn super_region(&self, id: SuperRegionId) -> &SuperRegion {
        &self.super_regions[id.0]
    }

    #[must_use]
    pub fn super_regions(&self) -> &[SuperRegion] {
        &self.super_regions
    }

    /// Builds a `width` x `height` hexagonal grid (offset columns) with a
    /// single super-region and uniform carrying capacity. Cells are keyed
    /// `"{column}_{row}"`.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::ConfigError` if the carrying capacity is
    /// negative.
    pub fn hex_grid(width: usize, height: usize, carrying_capacity: f64) -> Result<Landscape, RabiesError> {
        let region = SuperRegion {
            key: "all".to_string(),
            inbound_resistance: 0,
            outbound_resistance: 0,
        };
        let records = hex_grid_records(width, height, carrying_capacity, |_, _| "all".to_string());
        Landscape::new(records, vec![region])
    }
}

/// Cell records for a hexagonal grid with "odd-q" offset columns: odd
/// columns sit half a cell lower than even columns.
#[allow(clippy::cast_precision_loss)]
pub fn hex_grid_records(
    width: usize,
    height: usize,
    carrying_capacity: f64,
    region_of: impl Fn(usize, usize) -> String,
) -> Vec<CellRecord> {
    let key = |column: usize, row: usize| format!("{column}_{row}");
    let at = |column: isize, row: isize| -> Option<String> {
        let column = usize::try_from(column).ok()?;
        let row = usize::try_from(row).ok()?;
        (column < width && row < height).then(|| key(column, row))
    };
    let mut records = Vec::with_capacity(width * height);
    for row in 0..height {
        for column in 0..width {
            let (c, r) = (
                isize::try_from(column).unwrap_or(isize::MAX),
                isize::try_from(row).unwrap_or(isize::MAX),
            );
            // Rows grow southward.
            let (upper, lower) = if column % 2 == 0 { (r - 1, r) } else { (r, r + 1) };
            records.push(CellRecord {
                key: key(column, row),
                carrying_capacity,
                x: column as f64 * 1.5,
                y: row as f64 * 3f64.sqrt() + if column % 2 == 0 { 0.0 } else { 3f64.sqrt() / 2.0 },
                north: at(c, r - 1),
                north_east: at(c + 1, upper),
                south_east: at(c + 1, lower),
                south: at(c, r + 1),
                south_west: at(c - 1, lower),
                north_west: at(c - 1, upper),
                super_region: region_of(column, row),
            });
        }
    }
    records
}
