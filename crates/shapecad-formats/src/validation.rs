use std::path::{Path, PathBuf};

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Validation errors that prevent reading
    pub errors: Vec<String>,

    /// Warnings that don't prevent reading but indicate potential issues
    pub warnings: Vec<String>,

    /// Required files that do not exist
    pub missing: Vec<PathBuf>,
}

impl FormatValidation {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub struct FormatValidator;

impl FormatValidator {
    /// Validate that a file exists and is readable
    pub fn validate_file_exists(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        if !path.exists() {
            validation.errors.push(format!("File not found: {}", path.display()));
            validation.missing.push(path.to_path_buf());
            return validation;
        }
        if let Err(e) = std::fs::metadata(path) {
            validation.errors.push(format!("Cannot access file: {}", e));
        }

        validation
    }

    /// Validate that a file has a specific extension
    pub fn validate_extension(path: &Path, expected_ext: &str) -> FormatValidation {
        let mut validation = FormatValidation::default();

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(expected_ext) => {}
            Some(ext) => {
                validation.errors.push(format!(
                    "Unexpected file extension: .{} (expected .{})",
                    ext, expected_ext
                ));
            }
            None => {
                validation
                    .errors
                    .push(format!("File has no extension (expected .{})", expected_ext));
            }
        }

        validation
    }

    /// Sibling component of `main_path` with extension `ext`, e.g. the `.dbf`
    /// of `lots.v2.shp`. The case of the main extension is tried first, then
    /// the other case; when neither exists the first candidate is returned.
    pub fn component_path(main_path: &Path, ext: &str) -> PathBuf {
        let upper = main_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| !e.chars().any(|c| c.is_ascii_lowercase()));
        let (preferred, other) = if upper {
            (ext.to_ascii_uppercase(), ext.to_ascii_lowercase())
        } else {
            (ext.to_ascii_lowercase(), ext.to_ascii_uppercase())
        };

        let candidate = main_path.with_extension(preferred);
        if candidate.exists() {
            return candidate;
        }
        let fallback = main_path.with_extension(other);
        if fallback.exists() {
            fallback
        } else {
            candidate
        }
    }

    /// Validate that the component files of a multi-file format exist next to `main_path`
    pub fn validate_component_files(
        main_path: &Path,
        required_extensions: &[&str],
        optional_extensions: &[&str],
    ) -> FormatValidation {
        let mut validation = FormatValidation::default();

        for ext in required_extensions {
            let component_path = Self::component_path(main_path, ext);
            if !component_path.exists() {
                validation
                    .errors
                    .push(format!("Missing required file: {}", component_path.display()));
                validation.missing.push(component_path);
            }
        }

        for ext in optional_extensions {
            let component_path = Self::component_path(main_path, ext);
            if !component_path.exists() {
                validation.warnings.push(format!(
                    "Optional file not found: {} (projection will be unknown)",
                    component_path.display()
                ));
            }
        }

        validation
    }

    /// Merge several validation results
    pub fn merge_validations(validations: Vec<FormatValidation>) -> FormatValidation {
        let mut merged = FormatValidation::default();
        for validation in validations {
            merged.errors.extend(validation.errors);
            merged.warnings.extend(validation.warnings);
            merged.missing.extend(validation.missing);
        }
        merged
    }
}
