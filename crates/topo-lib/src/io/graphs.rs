use crate::collection::GraphCollection;
use crate::plot::class_name;
use crate::signal::Matrix;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Persisted graph collection: `W` is trials × rows × cols, `y` the aligned labels.
/// `shape` keeps rows × cols for records with no trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    #[serde(rename = "W")]
    pub w: Vec<Vec<Vec<f64>>>,
    #[serde(rename = "y")]
    pub y: Vec<i64>,
    #[serde(default)]
    pub shape: Option<[usize; 2]>,
}

impl GraphRecord {
    pub fn from_collection(graphs: &GraphCollection) -> Self {
        Self {
            w: graphs.items().iter().map(Matrix::to_rows).collect(),
            y: graphs.labels().to_vec(),
            shape: Some([graphs.item_shape().0, graphs.item_shape().1]),
        }
    }

    pub fn into_collection(self) -> Result<GraphCollection> {
        if self.w.len() != self.y.len() {
            bail!(
                "graph count {} does not match label count {}",
                self.w.len(),
                self.y.len()
            );
        }
        let mut items = Vec::with_capacity(self.w.len());
        for (idx, rows) in self.w.iter().enumerate() {
            items.push(Matrix::from_rows(rows).with_context(|| format!("graph {} is ragged", idx))?);
        }
        let shape = match (self.shape, items.first()) {
            (Some([rows, cols]), _) => (rows, cols),
            (None, Some(first)) => first.shape(),
            (None, None) => (0, 0),
        };
        let mut graphs = GraphCollection::new(shape);
        for (idx, (item, label)) in items.into_iter().zip(self.y).enumerate() {
            graphs
                .push(item, label)
                .with_context(|| format!("graph {}", idx))?;
        }
        Ok(graphs)
    }
}

pub fn write_graph_record(path: &Path, graphs: &GraphCollection) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &GraphRecord::from_collection(graphs))
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn read_graph_record(path: &Path) -> Result<GraphCollection> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let record: GraphRecord = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;
    record
        .into_collection()
        .with_context(|| format!("invalid graph record {}", path.display()))
}

/// Write `trial,label,class,x,y` rows for a 2-D embedding.
pub fn write_embedding_csv(
    path: &Path,
    coords: &Matrix,
    labels: &[i64],
    class_labels: &[String],
) -> Result<()> {
    if coords.rows() != labels.len() || coords.cols() != 2 {
        bail!(
            "embedding shape {:?} does not match {} labels",
            coords.shape(),
            labels.len()
        );
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(["trial", "label", "class", "x", "y"])?;
    for (i, label) in labels.iter().enumerate() {
        writer.write_record([
            i.to_string(),
            label.to_string(),
            class_name(*label, class_labels),
            coords.get(i, 0).to_string(),
            coords.get(i, 1).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Middle_Flexion".into(), "Pointer".into()]
    }

    #[test]
    fn record_uses_w_and_y_keys() {
        let mut graphs = GraphCollection::new((2, 2));
        graphs
            .push(Matrix::from_rows(&[vec![0.0, 0.4], vec![0.4, 0.0]]).unwrap(), 1)
            .unwrap();
        let value = serde_json::to_value(GraphRecord::from_collection(&graphs)).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&String> = obj.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["W", "shape", "y"]);
        assert_eq!(value["W"][0][1][0], 0.4);
        assert_eq!(value["shape"], serde_json::json!([2, 2]));
        assert_eq!(value["y"][0], 1);
    }

    #[test]
    fn written_record_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphs.json");
        let mut graphs = GraphCollection::new((2, 2));
        graphs.push(Matrix::identity(2), 0).unwrap();
        graphs.push(Matrix::zeros(2, 2), 1).unwrap();
        write_graph_record(&path, &graphs).unwrap();
        let back = read_graph_record(&path).unwrap();
        assert_eq!(back.shape(), (2, 2, 2));
        assert_eq!(back.labels(), &[0, 1]);
        assert_eq!(back.items()[0], Matrix::identity(2));
    }

    #[test]
    fn mixed_graph_shapes_are_rejected() {
        let record = GraphRecord {
            w: vec![vec![vec![0.0]], vec![vec![0.0, 1.0], vec![1.0, 0.0]]],
            y: vec![0, 1],
            shape: None,
        };
        assert!(record.into_collection().is_err());
    }

    #[test]
    fn empty_record_keeps_graph_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        write_graph_record(&path, &GraphCollection::new((8, 8))).unwrap();
        let back = read_graph_record(&path).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.shape(), (0, 8, 8));
    }

    #[test]
    fn record_without_shape_takes_it_from_first_graph() {
        let record: GraphRecord =
            serde_json::from_str(r#"{"W":[[[0.0,1.0],[1.0,0.0]]],"y":[3]}"#).unwrap();
        let graphs = record.into_collection().unwrap();
        assert_eq!(graphs.shape(), (1, 2, 2));
    }

    #[test]
    fn embedding_csv_names_classes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latent_space.csv");
        let coords = Matrix::from_rows(&[vec![0.5, -1.0], vec![2.0, 3.0]]).unwrap();
        write_embedding_csv(&path, &coords, &[1, 7], &names()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "trial,label,class,x,y");
        assert_eq!(lines[1], "0,1,Pointer,0.5,-1");
        assert_eq!(lines[2], "1,7,7,2,3");
    }
}
