use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;

use crate::error::RabiesError;
use crate::species::{SpeciesParameterValues, SpeciesParameters};

/// Reads species parameters from some external source. The format of the
/// source (spreadsheet, XML, database) is up to the implementation.
pub trait SpeciesParameterLoader {
    type Source: ?Sized;

    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the parameters it
    /// holds are invalid.
    fn load(&self, source: &Self::Source) -> Result<SpeciesParameters, RabiesError>;
}

/// Loads a `SpeciesParameterValues` JSON document from a file.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonSpeciesLoader;

impl SpeciesParameterLoader for JsonSpeciesLoader {
    type Source = Path;

    fn load(&self, source: &Path) -> Result<SpeciesParameters, RabiesError> {
        info!("loading species parameters from {}", source.display());
        let reader = BufReader::new(File::open(source)?);
        let values: SpeciesParameterValues = serde_json::from_reader(reader)?;
        SpeciesParameters::new(values)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::species::test_support::fox_values;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&fox_values()).unwrap().as_bytes())
            .unwrap();
        let params = JsonSpeciesLoader.load(file.path()).unwrap();
        assert_eq!(params.name(), "red fox");
        assert_eq!(params.independence_age(), 34);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = JsonSpeciesLoader.load(Path::new("/nonexistent/fox.json"));
        assert!(matches!(result, Err(RabiesError::IoError(_))));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{\"name\": \"fox\"").unwrap();
        let result = JsonSpeciesLoader.load(file.path());
        assert!(matches!(result, Err(RabiesError::JsonError(_))));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut values = fox_values();
        values.male_percent = -3.0;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&values).unwrap().as_bytes())
            .unwrap();
        let result = JsonSpeciesLoader.load(file.path());
        assert!(matches!(result, Err(RabiesError::ConfigError(_))));
    }
}
