//! End-to-end conversion of a study directory into the three output documents.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::assembler::{build_assay_table, build_study_table, parameter_name};
use crate::config::ConversionConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::discovery::{discover_data_files, discover_subjects, study_title};
use crate::error::{ConversionError, Result};
use crate::governor::govern;
use crate::header::ImageHeaderReader;
use crate::hierarchy::resolve_candidates;
use crate::investigation::render_investigation;
use crate::merge::merge_sidecars;
use crate::naming::FileIdentity;
use crate::ontology::annotate;
use crate::participants::{ParticipantTable, PARTICIPANTS_FILE};
use crate::record::MetadataRecord;
use crate::table::Table;

pub const STUDY_FILE: &str = "s_study.txt";
pub const ASSAY_FILE: &str = "a_assay.txt";
pub const INVESTIGATION_FILE: &str = "i_investigation.txt";

#[derive(Debug, Clone)]
pub struct Conversion {
    pub title: String,
    pub study: Table,
    pub assay: Table,
    /// Parameter names listed in the investigation document.
    pub parameter_names: Vec<String>,
    pub investigation: String,
    pub diagnostics: Diagnostics,
}

pub fn convert(
    study_root: &Path,
    config: &ConversionConfig,
    headers: &dyn ImageHeaderReader,
) -> Result<Conversion> {
    if !study_root.is_dir() {
        return Err(ConversionError::MissingStudyRoot {
            path: study_root.to_path_buf(),
        });
    }
    let vocabulary = &config.vocabulary;
    let mut diags = Diagnostics::new();

    let subjects = discover_subjects(study_root);
    let participants_path = study_root.join(PARTICIPANTS_FILE);
    let participants = if participants_path.is_file() {
        Some(ParticipantTable::read(&participants_path)?)
    } else {
        None
    };
    let study = build_study_table(&subjects, participants.as_ref(), &mut diags)?;
    let study = annotate(&study, &vocabulary.ontology, &mut diags)?;
    tracing::info!(subjects = subjects.len(), "built study table");

    let files = discover_data_files(study_root);
    let records = resolve_records(study_root, &files, headers, config.parallel, &mut diags)?;

    let assay = build_assay_table(&records, &vocabulary.synonyms, &mut diags)?;
    let assay = govern(assay, &config.policy, &vocabulary.ontology, &mut diags);
    let assay = annotate(&assay, &vocabulary.ontology, &mut diags)?;
    tracing::info!(
        files = records.len(),
        columns = assay.column_count(),
        "built assay table"
    );

    let parameter_names: Vec<String> = assay
        .column_names()
        .into_iter()
        .filter_map(parameter_name)
        .map(str::to_string)
        .collect();
    let title = study_title(study_root)?;
    let investigation = render_investigation(config.template(), &title, &parameter_names);

    Ok(Conversion {
        title,
        study,
        assay,
        parameter_names,
        investigation,
        diagnostics: diags,
    })
}

/// Resolve every file, optionally in parallel. Results are re-ordered by path
/// before the first failure is taken, so the thread schedule never reaches
/// the output or the reported error.
fn resolve_records(
    study_root: &Path,
    files: &[PathBuf],
    headers: &dyn ImageHeaderReader,
    parallel: bool,
    diags: &mut Diagnostics,
) -> Result<Vec<MetadataRecord>> {
    let resolve = |file: &PathBuf| (file.clone(), resolve_record(study_root, file, headers));
    let mut outcomes: Vec<(PathBuf, Result<(MetadataRecord, Diagnostics)>)> = if parallel {
        files.par_iter().map(resolve).collect()
    } else {
        files.iter().map(resolve).collect()
    };
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    let resolved = outcomes
        .into_iter()
        .map(|(_, outcome)| outcome)
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(resolved.len());
    for (record, file_diags) in resolved {
        diags.extend(file_diags);
        records.push(record);
    }
    Ok(records)
}

/// Metadata record for one file. A malformed sidecar fails the file; an
/// unreadable header only leaves the physical fields empty.
pub fn resolve_record(
    study_root: &Path,
    data_file: &Path,
    headers: &dyn ImageHeaderReader,
) -> Result<(MetadataRecord, Diagnostics)> {
    let mut diags = Diagnostics::new();
    let identity = FileIdentity::from_path(study_root, data_file);
    let doc = merge_sidecars(&resolve_candidates(study_root, data_file))?;

    let header = match headers.read_header(data_file) {
        Ok(header) => Some(header),
        Err(err) => {
            diags.warn(
                DiagnosticKind::UnreadableHeader,
                format!("cannot extract meta data from '{}': {err}", data_file.display()),
                [("path", data_file.display().to_string())],
            );
            None
        }
    };

    Ok((MetadataRecord::new(data_file, identity, &doc, header), diags))
}

/// Write the study, assay and investigation documents into `out_dir`.
pub fn write_outputs(conversion: &Conversion, out_dir: &Path) -> Result<Vec<PathBuf>> {
    if !out_dir.exists() {
        tracing::info!(path = %out_dir.display(), "creating output directory");
        fs::create_dir_all(out_dir).map_err(|e| ConversionError::io(out_dir, e))?;
    }

    let outputs = [
        (STUDY_FILE, conversion.study.to_tsv_string()),
        (ASSAY_FILE, conversion.assay.to_tsv_string()),
        (INVESTIGATION_FILE, conversion.investigation.clone()),
    ];
    let mut written = Vec::with_capacity(outputs.len());
    for (name, contents) in outputs {
        let path = out_dir.join(name);
        fs::write(&path, contents).map_err(|e| ConversionError::io(&path, e))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::ColumnPolicy;
    use crate::header::{HeaderError, ImageHeader};

    struct FixedHeaders;

    impl ImageHeaderReader for FixedHeaders {
        fn read_header(&self, path: &Path) -> std::result::Result<ImageHeader, HeaderError> {
            if path.to_string_lossy().contains("broken") {
                return Err(HeaderError::Unrecognized {
                    path: path.to_path_buf(),
                    reason: "test".into(),
                });
            }
            Ok(ImageHeader {
                voxel_sizes: vec![2.0, 2.0, 2.0],
                spatial_unit: "mm".into(),
                temporal_sampling: None,
                temporal_unit: None,
            })
        }
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = convert(&missing, &ConversionConfig::default(), &FixedHeaders).unwrap_err();
        assert!(matches!(err, ConversionError::MissingStudyRoot { .. }));
    }

    #[test]
    fn unreadable_header_degrades_the_record_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "sub-01/anat/sub-01_T1w.nii.gz", "");
        write(root, "sub-01/anat/sub-01_acq-broken_T1w.nii.gz", "");

        let conversion = convert(root, &ConversionConfig::default(), &FixedHeaders).unwrap();
        let resolution = conversion.assay.column("Parameter Value[resolution]").unwrap();
        assert_eq!(
            resolution.values,
            vec![Some("2.0x2.0x2.0".to_string()), None]
        );
        let warnings: Vec<_> = conversion
            .diagnostics
            .of_kind(DiagnosticKind::UnreadableHeader)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(conversion.diagnostics.warning_count(), 1);
    }

    #[test]
    fn malformed_sidecar_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "sub-01/anat/sub-01_T1w.nii.gz", "");
        write(root, "T1w.json", "{broken");
        let err = convert(root, &ConversionConfig::default(), &FixedHeaders).unwrap_err();
        match err {
            ConversionError::MalformedSidecar { path, .. } => {
                assert_eq!(path, root.join("T1w.json"))
            }
            other => panic!("expected MalformedSidecar, got {other:?}"),
        }
    }

    #[test]
    fn first_failing_path_is_reported_regardless_of_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for s in ["01", "02", "03", "04", "05", "06"] {
            write(root, &format!("sub-{s}/anat/sub-{s}_T1w.nii.gz"), "");
        }
        write(root, "sub-03/anat/sub-03_T1w.json", "{broken");
        write(root, "sub-05/anat/sub-05_T1w.json", "[also broken");

        for _ in 0..8 {
            match convert(root, &ConversionConfig::default(), &FixedHeaders) {
                Err(ConversionError::MalformedSidecar { path, .. }) => {
                    assert_eq!(path, root.join("sub-03/anat/sub-03_T1w.json"))
                }
                other => panic!("expected MalformedSidecar, got {other:?}"),
            }
        }
    }

    #[test]
    fn parallel_and_serial_runs_agree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for s in ["01", "02", "03", "04"] {
            write(root, &format!("sub-{s}/func/sub-{s}_task-rest_bold.nii.gz"), "");
            write(
                root,
                &format!("sub-{s}/func/sub-{s}_task-rest_bold.json"),
                &format!(r#"{{"EchoTime": 0.0{s}, "Extra{s}": "x"}}"#),
            );
        }
        let mut config = ConversionConfig {
            policy: ColumnPolicy::KeepAll,
            ..Default::default()
        };
        let parallel = convert(root, &config, &FixedHeaders).unwrap();
        config.parallel = false;
        let serial = convert(root, &config, &FixedHeaders).unwrap();
        assert_eq!(parallel.assay, serial.assay);
        assert_eq!(parallel.study, serial.study);
        assert_eq!(parallel.investigation, serial.investigation);
    }

    #[test]
    fn writes_three_documents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("study");
        write(&root, "sub-01/anat/sub-01_T1w.nii.gz", "");
        let conversion = convert(&root, &ConversionConfig::default(), &FixedHeaders).unwrap();
        let out = dir.path().join("out/nested");
        let written = write_outputs(&conversion, &out).unwrap();
        assert_eq!(written.len(), 3);
        for path in written {
            assert!(path.is_file(), "{} missing", path.display());
        }
        let study = fs::read_to_string(out.join(STUDY_FILE)).unwrap();
        assert!(study.starts_with("Source Name\t"));
    }
}
