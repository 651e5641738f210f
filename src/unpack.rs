//! Unpacking an LSD file into DSL source and companion files
//!
//! For `dict.lsd` the output directory receives:
//!
//! - `dict.dsl` - headings and articles, UTF-16LE
//! - `dict.bmp` - dictionary icon, when the file has one
//! - `dict.ann` - annotation, UTF-16LE, when non-empty
//! - `dict.pref` - decoder prefix block, UTF-8, only on request

use crate::container::LsdFile;
use crate::dsl::{DslHeader, DslWriter, Utf16Writer};
use crate::languages::dsl_language;
use crate::Result;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// What to write and where
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    output_dir: Option<PathBuf>,
    write_icon: bool,
    write_annotation: bool,
    write_prefix: bool,
}

impl UnpackOptions {
    /// Write DSL, icon and annotation next to the input file
    pub fn new() -> Self {
        Self {
            output_dir: None,
            write_icon: true,
            write_annotation: true,
            write_prefix: false,
        }
    }

    /// Write into `dir` instead of the input file's directory
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Toggle the `.bmp` icon file
    pub fn with_icon(mut self, enabled: bool) -> Self {
        self.write_icon = enabled;
        self
    }

    /// Toggle the `.ann` annotation file
    pub fn with_annotation(mut self, enabled: bool) -> Self {
        self.write_annotation = enabled;
        self
    }

    /// Toggle the `.pref` prefix file
    pub fn with_prefix(mut self, enabled: bool) -> Self {
        self.write_prefix = enabled;
        self
    }

    /// Output directory, if one was set
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Path of the companion file with `extension` for `input`
    pub fn output_path(&self, input: &Path, extension: &str) -> PathBuf {
        let stem = input.file_stem().unwrap_or_default();
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(extension);
        dir.join(name)
    }
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Files written and entry counts of one unpack run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackReport {
    /// DSL file, `None` when the dictionary had no entries
    pub dsl: Option<PathBuf>,
    /// Icon file
    pub icon: Option<PathBuf>,
    /// Annotation file
    pub annotation: Option<PathBuf>,
    /// Prefix file
    pub prefix: Option<PathBuf>,
    /// Articles written
    pub articles: usize,
    /// Heading records decoded, homographs included
    pub headings: usize,
}

impl UnpackReport {
    /// Every file written, in write order
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        [&self.icon, &self.annotation, &self.dsl, &self.prefix]
            .into_iter()
            .filter_map(|path| path.as_deref())
    }
}

/// Unpack the dictionary at `input`
pub fn unpack_file<P: AsRef<Path>>(input: P, options: &UnpackOptions) -> Result<UnpackReport> {
    unpack_with_progress(input.as_ref(), options, |_, _| {})
}

/// Unpack the dictionary at `input`, reporting `(done, total)` articles
pub fn unpack_with_progress<F>(
    input: &Path,
    options: &UnpackOptions,
    progress: F,
) -> Result<UnpackReport>
where
    F: FnMut(usize, usize),
{
    let file = LsdFile::open(input)?;
    unpack(&file, input, options, progress)
}

/// Write the companion files of an opened dictionary
///
/// `input` only supplies the base name of the outputs. Headings and every
/// article are decoded before the DSL file is created, so a failing
/// dictionary leaves no partial DSL behind.
pub fn unpack<F>(
    file: &LsdFile,
    input: &Path,
    options: &UnpackOptions,
    mut progress: F,
) -> Result<UnpackReport>
where
    F: FnMut(usize, usize),
{
    if let Some(dir) = &options.output_dir {
        fs::create_dir_all(dir)?;
    }

    let registry = file.read_headings()?;
    let total = registry.len();
    let mut articles = Vec::with_capacity(total);
    for (done, entry) in registry.iter().enumerate() {
        articles.push(file.read_article(entry)?);
        progress(done + 1, total);
    }

    let mut report = UnpackReport {
        headings: registry.appended(),
        articles: total,
        ..UnpackReport::default()
    };

    let info = file.info();
    if options.write_icon && info.has_icon() {
        let path = options.output_path(input, "bmp");
        fs::write(&path, &info.icon)?;
        debug!("Wrote icon {}", path.display());
        report.icon = Some(path);
    }

    if options.write_annotation {
        let annotation = file.read_annotation()?;
        if !annotation.is_empty() {
            let path = options.output_path(input, "ann");
            let mut out = Utf16Writer::new(BufWriter::new(File::create(&path)?))?;
            out.write_units(&annotation)?;
            out.finish()?;
            debug!("Wrote annotation {}", path.display());
            report.annotation = Some(path);
        }
    }

    if total == 0 {
        warn!("{}: no entries, nothing written to DSL", input.display());
    } else {
        let path = options.output_path(input, "dsl");
        let icon_file = report
            .icon
            .as_ref()
            .and_then(|icon| icon.file_name())
            .map(|name| name.to_string_lossy().into_owned());
        let header = DslHeader {
            name: &info.name,
            index_language: dsl_language(file.header().source_language),
            contents_language: dsl_language(file.header().target_language),
            icon_file: icon_file.as_deref(),
        };

        let mut writer = DslWriter::new(BufWriter::new(File::create(&path)?), &header)?;
        for (entry, article) in registry.iter().zip(&articles) {
            writer.write_entry(entry, article)?;
        }
        writer.finish()?;
        info!("Wrote {} articles to {}", total, path.display());
        report.dsl = Some(path);
    }

    let prefix = file.decoder().prefix();
    if options.write_prefix && !prefix.is_empty() {
        let path = options.output_path(input, "pref");
        fs::write(&path, String::from_utf16_lossy(prefix))?;
        debug!("Wrote prefix {}", path.display());
        report.prefix = Some(path);
    }

    Ok(report)
}
