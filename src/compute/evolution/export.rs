//! JSON export of finished searches, for plotting or replaying the best
//! route in another tool.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compute::NavGraph;
use crate::schema::{SearchResult, WaypointId};

/// Format version written into every export.
pub const EXPORT_VERSION: u32 = 1;

/// Exported search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathExport {
    /// Problem description.
    pub metadata: ExportMetadata,
    /// Best route, polyline, stats and history.
    pub result: SearchResult,
}

/// Problem description for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub version: u32,
    pub start: WaypointId,
    pub goal: WaypointId,
    pub waypoint_count: usize,
    pub link_count: usize,
}

impl PathExport {
    pub fn new(graph: &NavGraph, start: WaypointId, goal: WaypointId, result: SearchResult) -> Self {
        Self {
            metadata: ExportMetadata {
                version: EXPORT_VERSION,
                start,
                goal,
                waypoint_count: graph.len(),
                link_count: graph.link_count(),
            },
            result,
        }
    }

    /// Write as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Read an export written by [`PathExport::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
