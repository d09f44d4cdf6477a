//! Source kinds, build stages and the probe source mapping

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Compilation-unit categories the probe sketch exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Source {
    #[serde(rename = "c")]
    C,
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "S")]
    S,
    /// Sketch entry point, compiled by arduino-cli as a generated `.ino.cpp`
    #[serde(rename = "ino")]
    Ino,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::C, Source::Cpp, Source::S, Source::Ino];

    /// File extension used for the probe file of this kind
    pub fn extension(&self) -> &'static str {
        match self {
            Source::C => "c",
            Source::Cpp => "cpp",
            Source::S => "S",
            Source::Ino => "ino",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Build phases announced by arduino-cli in its verbose output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stage {
    LibraryDetection,
    Prototypes,
    Compilation,
    Libraries,
    Core,
    Link,
    Unknown,
}

impl Stage {
    const ANNOUNCEMENTS: [(&'static str, Stage); 6] = [
        ("Detecting libraries used...", Stage::LibraryDetection),
        ("Generating function prototypes...", Stage::Prototypes),
        ("Compiling sketch...", Stage::Compilation),
        ("Compiling libraries...", Stage::Libraries),
        ("Compiling core...", Stage::Core),
        ("Linking everything together...", Stage::Link),
    ];

    /// Maps a section announcement line to its stage
    pub fn from_announcement(title: &str) -> Stage {
        Self::ANNOUNCEMENTS
            .iter()
            .find(|(announcement, _)| *announcement == title)
            .map(|(_, stage)| *stage)
            .unwrap_or(Stage::Unknown)
    }

    /// Literal phrase arduino-cli prints when entering this stage
    pub fn announcement(&self) -> Option<&'static str> {
        Self::ANNOUNCEMENTS
            .iter()
            .find(|(_, stage)| stage == self)
            .map(|(announcement, _)| *announcement)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LibraryDetection => "library detection",
            Stage::Prototypes => "prototypes",
            Stage::Compilation => "compilation",
            Stage::Libraries => "libraries",
            Stage::Core => "core",
            Stage::Link => "link",
            Stage::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Total mapping from every [`Source`] to the probe file created for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    paths: BTreeMap<Source, PathBuf>,
}

impl SourceMap {
    /// Probe files named `<stem>.<ext>` inside `directory`
    pub fn new(directory: &Path, stem: &str) -> Self {
        let paths = Source::ALL
            .iter()
            .map(|source| {
                (
                    *source,
                    directory.join(format!("{}.{}", stem, source.extension())),
                )
            })
            .collect();
        Self { paths }
    }

    /// Probe files named after the sketch directory, as arduino-cli requires
    pub fn for_sketch_dir(directory: &Path) -> Option<Self> {
        let stem = directory.file_name()?.to_str()?;
        Some(Self::new(directory, stem))
    }

    pub fn path(&self, source: Source) -> &Path {
        // Every constructor fills all of Source::ALL
        &self.paths[&source]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Source, &Path)> {
        self.paths.iter().map(|(source, path)| (*source, path.as_path()))
    }

    /// Name the file carries inside the build directory.
    ///
    /// arduino-cli wraps the sketch entry point into `<name>.ino.cpp`, all other
    /// sources keep their own file name.
    pub fn real_name(&self, source: Source) -> String {
        let name = self
            .path(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match source {
            Source::Ino => format!("{}.cpp", name),
            _ => name,
        }
    }

    pub fn real_names(&self) -> Vec<String> {
        Source::ALL.iter().map(|source| self.real_name(*source)).collect()
    }

    /// Object files the compilation stage produces for the probe sources
    pub fn object_names(&self) -> Vec<String> {
        self.real_names()
            .into_iter()
            .map(|name| format!("{}.o", name))
            .collect()
    }

    /// Plain file name without the entry-point wrapper
    pub fn file_name(&self, source: Source) -> String {
        self.path(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
