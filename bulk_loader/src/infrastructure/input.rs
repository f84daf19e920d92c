use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::application::ports::LineSource;

const STDIN_ARG: &str = "-";

/// An input named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// One source per argument, `-` meaning standard input. No arguments
    /// reads standard input once.
    pub fn from_args(args: &[PathBuf]) -> Vec<Self> {
        if args.is_empty() {
            return vec![InputSource::Stdin];
        }
        args.iter().map(|arg| Self::from_arg(arg)).collect()
    }

    fn from_arg(arg: &Path) -> Self {
        if arg == Path::new(STDIN_ARG) {
            InputSource::Stdin
        } else {
            InputSource::File(arg.to_path_buf())
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => f.write_str("<stdin>"),
            InputSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl LineSource for InputSource {
    fn name(&self) -> String {
        self.to_string()
    }

    fn open(&self) -> std::io::Result<Box<dyn BufRead + '_>> {
        match self {
            InputSource::Stdin => Ok(Box::new(std::io::stdin().lock())),
            InputSource::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        }
    }
}
