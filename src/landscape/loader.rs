use std::io::Read;
use std::path::PathBuf;

use log::info;
use serde::de::DeserializeOwned;

use crate::error::RabiesError;
use crate::landscape::{CellRecord, Landscape, SuperRegion};

/// Reads the cells and super-regions of a landscape from some external
/// source.
pub trait LandscapeLoader {
    type Source: ?Sized;

    /// # Errors
    ///
    /// Returns an error if the source cannot be read or describes a
    /// malformed graph.
    fn load_landscape(&self, source: &Self::Source) -> Result<Landscape, RabiesError>;
}

/// The pair of CSV files that describe a landscape.
#[derive(Clone, Debug)]
pub struct LandscapeFiles {
    /// Columns: `key,carrying_capacity,x,y,north,north_east,south_east,
    /// south,south_west,north_west,super_region`.
    pub cells: PathBuf,
    /// Columns: `key,inbound_resistance,outbound_resistance`.
    pub super_regions: PathBuf,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct CsvLandscapeLoader;

impl CsvLandscapeLoader {
    fn read_records<T: DeserializeOwned, R: Read>(
        mut reader: csv::Reader<R>,
    ) -> Result<Vec<T>, RabiesError> {
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }

    /// Builds a landscape from in-memory CSV readers.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::CsvError` for unreadable rows and
    /// `RabiesError::ConfigError` for a malformed graph.
    pub fn from_readers(
        &self,
        cells: impl Read,
        super_regions: impl Read,
    ) -> Result<Landscape, RabiesError> {
        let regions: Vec<SuperRegion> = Self::read_records(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(super_regions),
        )?;
        let records: Vec<CellRecord> = Self::read_records(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(cells),
        )?;
        Landscape::new(records, regions)
    }
}

impl LandscapeLoader for CsvLandscapeLoader {
    type Source = LandscapeFiles;

    fn load_landscape(&self, source: &LandscapeFiles) -> Result<Landscape, RabiesError> {
        info!(
            "loading landscape from {} and {}",
            source.cells.display(),
            source.super_regions.display()
        );
        let regions = Self::read_records(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_path(&source.super_regions)?,
        )?;
        let records = Self::read_records(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_path(&source.cells)?,
        )?;
        let landscape = Landscape::new(records, regions)?;
        info!("loaded {} cells", landscape.len());
        Ok(landscape)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::landscape::Direction;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CELLS: &str = "\
key,carrying_capacity,x,y,north,north_east,south_east,south,south_west,north_west,super_region
a,3.0,0,0,,,,b,,,forest
b,1.5,0,1,a,,,none,,,forest
";
    const REGIONS: &str = "\
key,inbound_resistance,outbound_resistance
forest,10,20
";

    #[test]
    fn reads_cells_and_regions() {
        let landscape = CsvLandscapeLoader
            .from_readers(CELLS.as_bytes(), REGIONS.as_bytes())
            .unwrap();
        let a = landscape.cell_id("a").unwrap();
        let b = landscape.cell_id("b").unwrap();
        let cell = landscape.cell(a).unwrap();
        assert_eq!(cell.neighbor(Direction::South), Some(b));
        assert_eq!(cell.carrying_capacity(), 3.0);
        assert_eq!(landscape.cell(b).unwrap().neighbor(Direction::South), None);
        assert_eq!(landscape.super_regions()[0].outbound_resistance, 20);
    }

    #[test]
    fn loads_from_files() {
        let mut cells = NamedTempFile::new().unwrap();
        cells.write_all(CELLS.as_bytes()).unwrap();
        let mut regions = NamedTempFile::new().unwrap();
        regions.write_all(REGIONS.as_bytes()).unwrap();
        let files = LandscapeFiles {
            cells: cells.path().to_path_buf(),
            super_regions: regions.path().to_path_buf(),
        };
        let landscape = CsvLandscapeLoader.load_landscape(&files).unwrap();
        assert_eq!(landscape.len(), 2);
    }

    #[test]
    fn bad_number_is_csv_error() {
        let cells = "\
key,carrying_capacity,x,y,north,north_east,south_east,south,south_west,north_west,super_region
a,lots,0,0,,,,,,,forest
";
        let result = CsvLandscapeLoader.from_readers(cells.as_bytes(), REGIONS.as_bytes());
        assert!(matches!(result, Err(RabiesError::CsvError(_))));
    }

    #[test]
    fn dangling_neighbor_is_config_error() {
        let cells = "\
key,carrying_capacity,x,y,north,north_east,south_east,south,south_west,north_west,super_region
a,1,0,0,zz,,,,,,forest
";
        let result = CsvLandscapeLoader.from_readers(cells.as_bytes(), REGIONS.as_bytes());
        assert!(matches!(result, Err(RabiesError::ConfigError(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let files = LandscapeFiles {
            cells: PathBuf::from("/nonexistent/cells.csv"),
            super_regions: PathBuf::from("/nonexistent/regions.csv"),
        };
        assert!(CsvLandscapeLoader.load_landscape(&files).is_err());
    }
}
