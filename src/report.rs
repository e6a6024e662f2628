//! CSV reports: each report type is a serde struct written one row per
//! `send_report` call to the file registered for it with `add_report`.
use std::any::TypeId;
use std::cell::RefCell;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::animal::AnimalId;
use crate::context::Context;
use crate::error::RabiesError;
use crate::hashing::{HashMap, HashMapExt};
use crate::landscape::CellId;

pub trait Report: 'static {
    // Returns report type
    fn type_id(&self) -> TypeId;
    // Serializes the data with the correct writer
    fn serialize(&self, writer: &mut Writer<File>) -> Result<(), RabiesError>;
}

/// Use this macro to define a unique report type
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<std::fs::File>,
            ) -> Result<(), $crate::error::RabiesError> {
                writer.serialize(self)?;
                Ok(())
            }
        }
    };
}
pub use define_report;

struct ReportData {
    file_writers: RefCell<HashMap<TypeId, Writer<File>>>,
}

crate::data_plugin::define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        file_writers: RefCell::new(HashMap::new()),
    }
);

// Creates the file and any missing parent directories. Only CSV files are
// accepted.
fn create_report_file(path: &Path) -> Result<File, RabiesError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(RabiesError::ConfigError(format!(
            "report file {} must be a CSV",
            path.display()
        ))),
    }
}

pub trait ContextReportExt {
    /// Opens `path` for reports of type `T`, replacing any earlier file for
    /// that type.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::ConfigError` if `path` is not a `.csv` file and
    /// `RabiesError::IoError` if it cannot be created.
    fn add_report<T: Report>(&mut self, path: impl AsRef<Path>) -> Result<(), RabiesError>;

    /// Whether a file has been registered for reports of type `T`.
    fn has_report<T: Report>(&self) -> bool;

    /// Writes `report` as a row of the file registered for its type.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if no file was registered for
    /// the report type, and `RabiesError::CsvError` if the row cannot be
    /// written.
    fn send_report<T: Report>(&self, report: T) -> Result<(), RabiesError>;
}

impl ContextReportExt for Context {
    fn add_report<T: Report>(&mut self, path: impl AsRef<Path>) -> Result<(), RabiesError> {
        let file = create_report_file(path.as_ref())?;
        let data_container = self.get_data_mut(ReportPlugin);
        data_container
            .file_writers
            .borrow_mut()
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(())
    }

    fn has_report<T: Report>(&self) -> bool {
        self.get_data_container(ReportPlugin)
            .is_some_and(|data| data.file_writers.borrow().contains_key(&TypeId::of::<T>()))
    }

    fn send_report<T: Report>(&self, report: T) -> Result<(), RabiesError> {
        let missing = || RabiesError::MissingReference("no file registered for report".to_string());
        let data_container = self.get_data_container(ReportPlugin).ok_or_else(missing)?;
        let mut writers = data_container.file_writers.borrow_mut();
        let writer = writers.get_mut(&report.type_id()).ok_or_else(missing)?;
        report.serialize(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleEvent {
    Birth,
    Dispersal,
    Independence,
    Death,
}

/// One row of the lifecycle report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LifecycleReportItem {
    pub year: u32,
    pub week: u8,
    pub animal_id: AnimalId,
    pub event: LifecycleEvent,
    pub cell: CellId,
}

define_report!(LifecycleReportItem);
