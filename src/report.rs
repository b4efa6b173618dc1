//! Text and JSON renderings of solved grids.

use crate::error::CliError;
use glam::IVec3;
use modular_core::{Catalog, GridStore};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One collapsed cell in global coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub pos: [i32; 3],
    pub module: String,
    pub variant: Option<String>,
}

fn glyph(grid: &GridStore, catalog: &Catalog, pos: IVec3) -> char {
    let Some(cell) = grid.get(pos) else {
        return '.';
    };
    cell.module()
        .and_then(|id| catalog.module(id))
        .and_then(|m| m.name().chars().next())
        .unwrap_or('?')
}

/// One block per Y level, rows along Z, columns along X.
pub fn render_layers(grid: &GridStore, catalog: &Catalog) -> String {
    let size = grid.size();
    let mut out = String::new();
    for y in 0..size.y {
        let _ = writeln!(out, "y = {}", y);
        for z in 0..size.z {
            let row: String = (0..size.x)
                .map(|x| glyph(grid, catalog, IVec3::new(x, y, z)))
                .collect();
            out.push_str(&row);
            out.push('\n');
        }
    }
    out
}

/// Collapsed cells of `grid`, offset by the grid's global `origin`.
pub fn cell_records(grid: &GridStore, catalog: &Catalog, origin: IVec3) -> Vec<CellRecord> {
    grid.iter()
        .filter_map(|cell| {
            let module = catalog.module(cell.module()?)?;
            let variant = cell
                .variant()
                .and_then(|i| module.variants().get(i))
                .map(|v| v.name.clone());
            Some(CellRecord {
                pos: (origin + cell.position()).to_array(),
                module: module.name().to_string(),
                variant,
            })
        })
        .collect()
}

pub fn write_records(path: &Path, records: &[CellRecord]) -> Result<(), CliError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
