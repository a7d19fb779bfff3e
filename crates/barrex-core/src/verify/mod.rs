//! Structural verification of the exported ONNX artifact.
//!
//! Decodes the artifact's protobuf and reports input dimensions, output
//! shapes, and the declared opset version. Verification is advisory: callers
//! print failures as warnings and never let them overturn a successful
//! export.

pub mod onnx;

use prost::Message;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::{BarrexError, Result};

/// One named tensor shape; symbolic dimensions render as their parameter
/// name, unknown ones as `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    pub dims: Vec<Dim>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    Value(i64),
    Param(String),
    Unknown,
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Value(v) => write!(f, "{v}"),
            Dim::Param(p) => f.write_str(p),
            Dim::Unknown => f.write_str("?"),
        }
    }
}

/// Read-only metadata describing a produced artifact.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub producer: Option<String>,
    /// Declared version of the default (ai.onnx) operator set.
    pub opset_version: Option<i64>,
    /// True graph inputs (initializers excluded).
    pub inputs: Vec<TensorInfo>,
    pub outputs: Vec<TensorInfo>,
    pub node_count: usize,
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opset_version {
            Some(v) => writeln!(f, "  Opset version: {v}")?,
            None => writeln!(f, "  Opset version: undeclared")?,
        }
        if let Some(ref producer) = self.producer {
            writeln!(f, "  Producer: {producer}")?;
        }
        writeln!(f, "  Nodes: {}", self.node_count)?;
        for input in &self.inputs {
            writeln!(f, "  Input '{}' shape: {}", input.name, format_dims(&input.dims))?;
        }
        writeln!(f, "  Output count: {}", self.outputs.len())?;
        for (i, output) in self.outputs.iter().enumerate() {
            writeln!(
                f,
                "  Output {} '{}' shape: {}",
                i,
                output.name,
                format_dims(&output.dims)
            )?;
        }
        Ok(())
    }
}

fn format_dims(dims: &[Dim]) -> String {
    let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Load and structurally check an exported artifact.
pub fn verify_artifact(path: &Path) -> Result<VerificationReport> {
    let bytes = std::fs::read(path).map_err(|e| BarrexError::VerifyFailed {
        message: format!("Cannot read {}: {e}", path.display()),
    })?;

    let model = onnx::ModelProto::decode(bytes.as_slice()).map_err(|e| {
        BarrexError::VerifyFailed {
            message: format!("Not a valid ONNX protobuf: {e}"),
        }
    })?;

    report_for_model(&model)
}

fn report_for_model(model: &onnx::ModelProto) -> Result<VerificationReport> {
    let graph = model.graph.as_ref().ok_or_else(|| BarrexError::VerifyFailed {
        message: "Model has no graph".to_string(),
    })?;

    // Some exporters list weights among graph inputs; an input backed by an
    // initializer is not fed by the runtime.
    let initializer_names: HashSet<&str> = graph
        .initializer
        .iter()
        .filter_map(|t| t.name.as_deref())
        .collect();

    let inputs: Vec<TensorInfo> = graph
        .input
        .iter()
        .filter(|vi| {
            vi.name
                .as_deref()
                .map_or(true, |n| !initializer_names.contains(n))
        })
        .map(tensor_info)
        .collect();

    if inputs.is_empty() {
        return Err(BarrexError::VerifyFailed {
            message: "Model declares no runtime inputs".to_string(),
        });
    }

    let outputs: Vec<TensorInfo> = graph.output.iter().map(tensor_info).collect();
    if outputs.is_empty() {
        return Err(BarrexError::VerifyFailed {
            message: "Model declares no outputs".to_string(),
        });
    }

    // The default operator set has an empty or "ai.onnx" domain.
    let opset_version = model
        .opset_import
        .iter()
        .find(|o| matches!(o.domain.as_deref(), None | Some("") | Some("ai.onnx")))
        .or_else(|| model.opset_import.first())
        .and_then(|o| o.version);

    Ok(VerificationReport {
        producer: model.producer_name.clone(),
        opset_version,
        inputs,
        outputs,
        node_count: graph.node.len(),
    })
}

fn tensor_info(vi: &onnx::ValueInfoProto) -> TensorInfo {
    let dims = vi
        .r#type
        .as_ref()
        .and_then(|t| t.tensor_type.as_ref())
        .and_then(|t| t.shape.as_ref())
        .map(|shape| {
            shape
                .dim
                .iter()
                .map(|d| match (&d.dim_value, &d.dim_param) {
                    (Some(v), _) => Dim::Value(*v),
                    (None, Some(p)) if !p.is_empty() => Dim::Param(p.clone()),
                    _ => Dim::Unknown,
                })
                .collect()
        })
        .unwrap_or_default();

    TensorInfo {
        name: vi.name.clone().unwrap_or_default(),
        dims,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use tempfile::TempDir;

    fn value_info(name: &str, dims: &[i64]) -> onnx::ValueInfoProto {
        onnx::ValueInfoProto {
            name: Some(name.to_string()),
            r#type: Some(onnx::TypeProto {
                tensor_type: Some(onnx::TensorTypeProto {
                    elem_type: Some(1), // float
                    shape: Some(onnx::TensorShapeProto {
                        dim: dims
                            .iter()
                            .map(|&v| onnx::DimensionProto {
                                dim_value: Some(v),
                                dim_param: None,
                            })
                            .collect(),
                    }),
                }),
            }),
        }
    }

    fn yolo_like_model() -> onnx::ModelProto {
        onnx::ModelProto {
            ir_version: Some(6),
            producer_name: Some("pytorch".to_string()),
            producer_version: None,
            model_version: None,
            graph: Some(onnx::GraphProto {
                node: vec![onnx::NodeProto {
                    input: vec!["images".to_string(), "conv.weight".to_string()],
                    output: vec!["output0".to_string()],
                    name: Some("Conv_0".to_string()),
                    op_type: Some("Conv".to_string()),
                }],
                name: Some("main_graph".to_string()),
                initializer: vec![onnx::TensorProto {
                    dims: vec![16, 3, 3, 3],
                    data_type: Some(1),
                    name: Some("conv.weight".to_string()),
                }],
                input: vec![
                    value_info("images", &[1, 3, 640, 640]),
                    value_info("conv.weight", &[16, 3, 3, 3]),
                ],
                output: vec![value_info("output0", &[1, 84, 8400])],
            }),
            opset_import: vec![onnx::OperatorSetIdProto {
                domain: Some(String::new()),
                version: Some(9),
            }],
        }
    }

    #[test]
    fn test_verify_roundtrip_reports_shapes_and_opset() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.onnx");
        std::fs::write(&path, yolo_like_model().encode_to_vec()).unwrap();

        let report = verify_artifact(&path).unwrap();
        assert_eq!(report.opset_version, Some(9));
        assert_eq!(report.producer.as_deref(), Some("pytorch"));
        assert_eq!(report.node_count, 1);

        // Initializer-backed input is filtered out.
        assert_eq!(report.inputs.len(), 1);
        assert_eq!(report.inputs[0].name, "images");
        assert_eq!(
            report.inputs[0].dims,
            vec![Dim::Value(1), Dim::Value(3), Dim::Value(640), Dim::Value(640)]
        );

        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].dims.len(), 3);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("not-onnx.onnx");
        // A long varint key that never terminates is invalid protobuf.
        std::fs::write(&path, [0xff; 64]).unwrap();

        let err = verify_artifact(&path).unwrap_err();
        assert!(matches!(err, BarrexError::VerifyFailed { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_verify_missing_file_is_nonfatal() {
        let err = verify_artifact(Path::new("/nonexistent/model.onnx")).unwrap_err();
        assert!(matches!(err, BarrexError::VerifyFailed { .. }));
    }

    #[test]
    fn test_verify_requires_graph() {
        let model = onnx::ModelProto {
            graph: None,
            ..yolo_like_model()
        };
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.onnx");
        std::fs::write(&path, model.encode_to_vec()).unwrap();

        assert!(verify_artifact(&path).is_err());
    }

    #[test]
    fn test_symbolic_dims_render_as_params() {
        let mut model = yolo_like_model();
        let graph = model.graph.as_mut().unwrap();
        graph.input[0]
            .r#type
            .as_mut()
            .unwrap()
            .tensor_type
            .as_mut()
            .unwrap()
            .shape
            .as_mut()
            .unwrap()
            .dim[0] = onnx::DimensionProto {
            dim_value: None,
            dim_param: Some("batch".to_string()),
        };

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dynamic.onnx");
        std::fs::write(&path, model.encode_to_vec()).unwrap();

        let report = verify_artifact(&path).unwrap();
        assert_eq!(report.inputs[0].dims[0], Dim::Param("batch".to_string()));
        let rendered = report.to_string();
        assert!(rendered.contains("[batch, 3, 640, 640]"));
    }
}
