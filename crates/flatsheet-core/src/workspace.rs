//! Instance registry: instance name -> loaded sheet.

use crate::config::StoreConfig;
use crate::document::{Sheet, validate_instance_name};
use crate::error::Result;
use crate::model::{Request, Response, SheetChange};
use dashmap::DashMap;
use tracing::{debug, info};

/// Callback invoked after every saved mutation.
pub type Listener = Box<dyn Fn(&SheetChange) + Send + Sync>;

/// Owns every loaded sheet of one data directory.
///
/// Sheets are loaded from disk the first time an operation names them and
/// stay in memory until [`Workspace::unload`]. An operation holds the entry
/// for its whole duration, so operations on one instance never interleave.
pub struct Workspace {
    config: StoreConfig,
    sheets: DashMap<String, Sheet>,
    listeners: Vec<Listener>,
}

impl Workspace {
    pub fn new(config: StoreConfig) -> Self {
        Workspace {
            config,
            sheets: DashMap::new(),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Register a change listener.
    pub fn subscribe(&mut self, listener: impl Fn(&SheetChange) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// (Re)load an instance from disk, replacing any in-memory copy.
    pub fn load(&self, name: &str) -> Result<()> {
        let sheet = Sheet::load(name, &self.config)?;
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    /// Save a loaded instance. Returns false when it is not loaded.
    pub fn save(&self, name: &str) -> Result<bool> {
        match self.sheets.get(name) {
            Some(sheet) => sheet.save().map(|()| true),
            None => Ok(false),
        }
    }

    /// Drop an instance from memory. Its files are untouched.
    pub fn unload(&self, name: &str) -> bool {
        let removed = self.sheets.remove(name).is_some();
        if removed {
            debug!(instance = name, "unloaded sheet");
        }
        removed
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Names of loaded instances, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sheets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Run `f` against an instance, loading it first if needed.
    ///
    /// A failed load leaves no entry behind.
    pub fn with_sheet<T>(&self, name: &str, f: impl FnOnce(&mut Sheet) -> Result<T>) -> Result<T> {
        validate_instance_name(name)?;
        let mut entry = self
            .sheets
            .entry(name.to_string())
            .or_try_insert_with(|| Sheet::load(name, &self.config))?;
        f(entry.value_mut())
    }

    /// Execute one operation against an instance.
    pub fn dispatch(&self, instance: &str, request: Request) -> Result<Response> {
        let operation = request.name();
        let mutating = request.is_mutating();
        info!(instance, operation, "operation requested");

        let response = self.with_sheet(instance, |sheet| apply(sheet, request))?;

        if mutating {
            let change = SheetChange {
                instance: instance.to_string(),
                operation: operation.to_string(),
            };
            for listener in &self.listeners {
                listener(&change);
            }
        }
        Ok(response)
    }
}

fn apply(sheet: &mut Sheet, request: Request) -> Result<Response> {
    let response = match request {
        Request::View { range } => Response::View(sheet.view(range.as_deref())?),
        Request::Get { cell } => Response::Get(sheet.get(&cell)?),
        Request::Set { cell, value } => Response::View(sheet.set(&cell, &value)?),
        Request::Add { values } => Response::View(sheet.add(&values)?),
        Request::Remove { row } => Response::View(sheet.remove(row)?),
        Request::Update { row, values } => Response::View(sheet.update(row, &values)?),
        Request::Query { condition, limit } => Response::Query(sheet.query(&condition, limit)?),
        Request::Sort { column, order } => Response::View(sheet.sort(&column, order)?),
        Request::Fill { range, pattern } => Response::View(sheet.fill(&range, &pattern)?),
        Request::Schema => Response::Schema(sheet.schema()),
        Request::Resize { rows, cols } => Response::View(sheet.resize(rows, cols)?),
        Request::Ingest { file, csv } => {
            Response::View(sheet.ingest(file.as_deref(), csv.as_deref())?)
        }
        Request::Dump { file } => Response::Dump(sheet.dump(file.as_deref())?),
        Request::Clear { range } => Response::View(sheet.clear(range.as_deref())?),
        Request::Rename { column, name } => Response::View(sheet.rename(&column, &name)?),
        Request::Recalculate => Response::View(sheet.recalculate()?),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetError;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_lazy_load_and_unload() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(StoreConfig::new(dir.path()));
        assert!(!ws.is_loaded("default"));
        ws.dispatch("default", Request::Schema).unwrap();
        assert_eq!(ws.names(), ["default"]);
        assert!(ws.unload("default"));
        assert!(!ws.unload("default"));
        assert!(!ws.save("default").unwrap());
    }

    #[test]
    fn test_load_replaces_in_memory_copy() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(StoreConfig::new(dir.path()));
        ws.dispatch(
            "notes",
            Request::Set {
                cell: "A1".into(),
                value: "old".into(),
            },
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.csv"), "A\nnew\n").unwrap();

        ws.load("notes").unwrap();
        let value = ws
            .with_sheet("notes", |sheet| Ok(sheet.grid().value(0, 0).to_string()))
            .unwrap();
        assert_eq!(value, "new");
        assert!(ws.save("notes").unwrap());
    }

    #[test]
    fn test_invalid_instance_name_is_not_registered() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(StoreConfig::new(dir.path()));
        let err = ws.dispatch("../up", Request::Schema).unwrap_err();
        assert!(matches!(err, SheetError::InvalidInstanceName(_)));
        assert!(ws.names().is_empty());
    }

    #[test]
    fn test_failed_load_leaves_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.formulas.json"), "not json").unwrap();
        let ws = Workspace::new(StoreConfig::new(dir.path()));
        assert!(matches!(
            ws.dispatch("broken", Request::Schema),
            Err(SheetError::Json(_))
        ));
        assert!(!ws.is_loaded("broken"));
    }

    #[test]
    fn test_listeners_see_only_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new(StoreConfig::new(dir.path()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        ws.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

        ws.dispatch("budget", Request::View { range: None }).unwrap();
        ws.dispatch(
            "budget",
            Request::Set {
                cell: "A1".into(),
                value: "1".into(),
            },
        )
        .unwrap();
        assert!(
            ws.dispatch("budget", Request::Remove { row: 99 })
                .is_err()
        );

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![SheetChange {
                instance: "budget".into(),
                operation: "set".into()
            }]
        );
    }
}
