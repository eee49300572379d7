//! CSV tables written through polars.

use anyhow::{Context, Result};
use edgecurve::prelude::*;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// One row per node of every polyline, in key then sequence order.
pub fn points_frame(store: &PolylineStore) -> Result<DataFrame> {
    let mut polyline = Vec::new();
    let mut curve = Vec::new();
    let mut index = Vec::new();
    let (mut x, mut y, mut z) = (Vec::new(), Vec::new(), Vec::new());
    let mut endpoint = Vec::new();
    for s in summaries(store) {
        for row in point_rows(store, s.key)? {
            polyline.push(s.label.clone());
            curve.push(s.curve.as_str());
            index.push(row.index as u32);
            x.push(row.position.x);
            y.push(row.position.y);
            z.push(row.position.z);
            endpoint.push(row.is_endpoint);
        }
    }
    let df = df!(
        "polyline" => polyline,
        "curve" => curve,
        "index" => index,
        "x" => x,
        "y" => y,
        "z" => z,
        "endpoint" => endpoint
    )?;
    Ok(df)
}

/// Per-tick counters of a simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub tick: u32,
    pub moved: u32,
    pub writes: u32,
    pub faults: u32,
    pub skipped: u32,
}

pub fn ticks_frame(stats: &[TickStats]) -> Result<DataFrame> {
    let field = |f: fn(&TickStats) -> u32| stats.iter().map(f).collect::<Vec<u32>>();
    let df = df!(
        "tick" => field(|s| s.tick),
        "moved" => field(|s| s.moved),
        "writes" => field(|s| s.writes),
        "faults" => field(|s| s.faults),
        "skipped" => field(|s| s.skipped)
    )?;
    Ok(df)
}

pub fn write_csv(df: &mut DataFrame, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    let mut file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(rows = df.height(), out = %out.display(), "wrote csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgecurve::host::MemoryMesh;
    use nalgebra::vector;
    use tempfile::tempdir;

    #[test]
    fn points_table_has_one_row_per_node() {
        let mut host = MemoryHost::new();
        let mesh = host.add_mesh(MemoryMesh::new(vec![
            vector![0.0, 0.0, 0.0],
            vector![1.0, 0.0, 0.0],
        ]));
        let mut store = PolylineStore::new();
        let cfg = GenerateCfg {
            samples: 3,
            curve: CurveType::Linear,
            ..GenerateCfg::default()
        };
        generate_polyline(&mut store, &mut host, &EdgeSelection::single(mesh, 0, 1), &cfg).unwrap();
        let df = points_frame(&store).unwrap();
        assert_eq!(df.shape(), (4, 7));
        let ends: Vec<Option<bool>> = df.column("endpoint").unwrap().bool().unwrap().into_iter().collect();
        assert_eq!(ends, [Some(true), Some(false), Some(false), Some(true)]);

        let dir = tempdir().unwrap();
        let out = dir.path().join("nested/points.csv");
        let mut df = df;
        write_csv(&mut df, &out).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("polyline,curve,index,x,y,z,endpoint"));
        assert_eq!(lines.count(), 4);
    }

    #[test]
    fn empty_tick_table_still_has_columns() {
        let df = ticks_frame(&[]).unwrap();
        assert_eq!(df.shape(), (0, 5));
    }
}
