use crate::attr::{clear_or_already_absent, AttributeStore, Mechanism, ATTRIBUTE_NAME, MARKER_VALUE};
use crate::{Result, SkipperError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Argument conventions of the supported helper programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperSyntax {
    /// Linux `attr`: `-g NAME`, `-s NAME -V VALUE`, `-r NAME`
    Attr,
    /// macOS `xattr`: `-p NAME`, `-w NAME VALUE`, `-d NAME`
    Xattr,
}

impl HelperSyntax {
    pub fn default_program(&self) -> &'static str {
        match self {
            HelperSyntax::Attr => "attr",
            HelperSyntax::Xattr => "xattr",
        }
    }

    fn get_args(&self, name: &str) -> Vec<OsString> {
        match self {
            HelperSyntax::Attr => vec!["-g".into(), name.into()],
            HelperSyntax::Xattr => vec!["-p".into(), name.into()],
        }
    }

    fn set_args(&self, name: &str, value: &str) -> Vec<OsString> {
        match self {
            HelperSyntax::Attr => vec!["-s".into(), name.into(), "-V".into(), value.into()],
            HelperSyntax::Xattr => vec!["-w".into(), name.into(), value.into()],
        }
    }

    fn clear_args(&self, name: &str) -> Vec<OsString> {
        match self {
            HelperSyntax::Attr => vec!["-r".into(), name.into()],
            HelperSyntax::Xattr => vec!["-d".into(), name.into()],
        }
    }
}

/// Store that shells out to an attribute helper program per call.
/// The path always goes last on the command line.
#[derive(Debug, Clone)]
pub struct CommandStore {
    program: PathBuf,
    syntax: HelperSyntax,
    name: String,
}

impl CommandStore {
    pub fn new(syntax: HelperSyntax) -> Self {
        Self {
            program: PathBuf::from(syntax.default_program()),
            syntax,
            name: ATTRIBUTE_NAME.to_string(),
        }
    }

    /// `xattr` on macOS, `attr` everywhere else.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new(HelperSyntax::Xattr)
        } else {
            Self::new(HelperSyntax::Attr)
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn syntax(&self) -> HelperSyntax {
        self.syntax
    }

    fn run(&self, mut args: Vec<OsString>, path: &Path) -> std::io::Result<()> {
        args.push(path.as_os_str().to_os_string());
        debug!("Running {:?} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("{} exited with {}", self.program.display(), output.status)
        } else {
            stderr
        };
        Err(std::io::Error::new(std::io::ErrorKind::Other, message))
    }
}

impl AttributeStore for CommandStore {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Command
    }

    fn get(&self, path: &Path) -> bool {
        self.run(self.syntax.get_args(&self.name), path).is_ok()
    }

    fn set(&self, path: &Path) -> Result<()> {
        self.run(self.syntax.set_args(&self.name, MARKER_VALUE), path)
            .map_err(|e| SkipperError::attribute(path, e))
    }

    fn clear(&self, path: &Path) -> Result<()> {
        match self.run(self.syntax.clear_args(&self.name), path) {
            Ok(()) => Ok(()),
            // The helper ran but refused; it also refuses when nothing is set.
            Err(e) if e.kind() == std::io::ErrorKind::Other => {
                clear_or_already_absent(self, path, SkipperError::attribute(path, e))
            }
            Err(e) => Err(SkipperError::attribute(path, e)),
        }
    }
}
