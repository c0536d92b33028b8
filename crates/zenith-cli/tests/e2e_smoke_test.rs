use std::{fs, path::PathBuf};

use tempfile::tempdir;

use zenith::config::OutputFormat;
use zenith_cli::{Args, run};

/// Collects all .zen files from a directory
fn collect_zen_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("zen")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn samples_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("samples")
}

fn args_for(input: &PathBuf, output: PathBuf, format: Option<OutputFormat>) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        config: None,
        format,
        positions: false,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_samples() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let valid_samples = collect_zen_files(samples_path());

    assert!(
        !valid_samples.is_empty(),
        "No valid samples found in samples/"
    );

    let mut failed_samples = Vec::new();

    for sample_path in &valid_samples {
        for format in [OutputFormat::Sexp, OutputFormat::Tree, OutputFormat::Tokens] {
            let output_filename = format!(
                "{}.{format}",
                sample_path.file_stem().unwrap().to_string_lossy()
            );
            let output_path = temp_dir.path().join(output_filename);
            let args = args_for(sample_path, output_path.clone(), Some(format));

            match run(&args) {
                Ok(()) => {
                    let written = fs::read_to_string(&output_path).expect("Output was written");
                    assert!(!written.is_empty(), "{} produced no output", sample_path.display());
                }
                Err(e) => failed_samples.push((sample_path.clone(), format, e)),
            }
        }
    }

    if !failed_samples.is_empty() {
        eprintln!("\nValid samples that failed:");
        for (path, format, err) in &failed_samples {
            eprintln!("  - {} ({format}): {}", path.display(), err);
        }
        panic!("{} valid sample run(s) failed unexpectedly", failed_samples.len());
    }
}

#[test]
fn e2e_smoke_test_error_samples() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_samples = collect_zen_files(samples_path().join("errors"));

    assert!(
        !error_samples.is_empty(),
        "No error samples found in samples/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for sample_path in &error_samples {
        let output_filename = format!(
            "error_{}.sexp",
            sample_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);
        let args = args_for(sample_path, output_path, None);

        if run(&args).is_ok() {
            unexpectedly_succeeded.push(sample_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError samples that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error sample(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_missing_input_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("absent.zen");
    let args = args_for(&input, temp_dir.path().join("out.sexp"), None);

    assert!(matches!(run(&args), Err(zenith::ZenithError::Io(_))));
}
