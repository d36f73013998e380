use console::style;
use shapecad_core::ErrorKind;
use shapecad_pipeline::ConversionError;
use std::fmt;

/// Error type with suggestions, printed once at the top level
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
    pub exit_code: i32,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
            exit_code: 1,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }

    /// JSON form for `--json` mode
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "error",
            "message": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
        })
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for an output that would be overwritten
pub fn output_exists(paths: &[std::path::PathBuf]) -> CliError {
    let listed: Vec<String> = paths.iter().map(|p| format!("  {}", p.display())).collect();
    CliError::new("Output already exists")
        .with_context(format!("These files would be replaced:\n{}", listed.join("\n")))
        .with_suggestion("Choose a different output path")
        .with_suggestion("Or pass --force to overwrite")
        .with_help("Run: shapecad convert --help")
}

/// Create error for a path whose extension names no supported format
pub fn unknown_direction(input: &str, output: &str) -> CliError {
    CliError::new("Cannot infer conversion direction")
        .with_context(format!(
            "Expected one .dxf and one .shp path.\n\nInput: {}\nOutput: {}",
            input, output
        ))
        .with_suggestion("Use .dxf and .shp extensions")
        .with_suggestion("Or pass --direction dxf-to-shp / shp-to-dxf")
        .with_help("Run: shapecad convert --help")
}

/// Create error for an invalid configuration value
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check the --config file and SHAPECAD_* environment variables")
        .with_help("Run: shapecad config")
}

/// Describe a failed conversion with suggestions for its error kind
pub fn conversion_failed(error: &ConversionError) -> CliError {
    let base = CliError::new(format!("Conversion failed during {}", error.state))
        .with_context(error.source.to_string());

    match error.kind() {
        ErrorKind::InputNotFound => base
            .with_suggestion("Check the input path and try again")
            .with_suggestion("A shapefile needs its .shx and .dbf next to the .shp"),
        ErrorKind::UnreadableFormat => base
            .with_suggestion("Open the file in its authoring application and re-save it")
            .with_help("Run: shapecad analyze <path>"),
        ErrorKind::UnsupportedCrs => base
            .with_suggestion("Use --datum GDA1994|GDA2020 and --zone 50-56 or geographic")
            .with_help("Run: shapecad crs list"),
        ErrorKind::EmptyResult => base
            .with_suggestion("Check that the drawing holds points, lines, polylines or circles")
            .with_suggestion("Or relax the --only filter")
            .with_help("Run: shapecad analyze <path>"),
        ErrorKind::Cancelled => base.with_exit_code(130),
        ErrorKind::WriteFailed | ErrorKind::Io => base
            .with_suggestion("Check that the output directory exists and is writable"),
        ErrorKind::ConfigInvalid => base.with_help("Run: shapecad config"),
    }
}

/// Convert anyhow::Error to CliError, keeping typed errors raised by commands
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };

    if let Some(conversion) = error.downcast_ref::<ConversionError>() {
        return conversion_failed(conversion);
    }

    if let Some(shapecad_core::ShapecadError::ConfigInvalid { key, reason }) =
        error.downcast_ref::<shapecad_core::ShapecadError>()
    {
        return invalid_config(key, reason);
    }

    let chain: Vec<String> = error.chain().skip(1).map(|cause| cause.to_string()).collect();
    let cli_error = CliError::new(error.to_string());
    if chain.is_empty() {
        cli_error
    } else {
        cli_error.with_context(format!("Caused by: {}", chain.join(": ")))
    }
}
