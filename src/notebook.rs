//! Flattening of Jupyter notebooks into plain text.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GrabError, Result};

/// nbformat stores multiline strings either whole or split into lines that
/// keep their own terminators.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Whole(String),
    Lines(Vec<String>),
}

impl MultilineText {
    pub fn to_text(&self) -> String {
        match self {
            MultilineText::Whole(text) => text.clone(),
            MultilineText::Lines(lines) => lines.concat(),
        }
    }
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Whole(String::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    pub nbformat: u32,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown {
        #[serde(default)]
        source: MultilineText,
    },
    Code {
        #[serde(default)]
        source: MultilineText,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        #[serde(default)]
        text: Option<MultilineText>,
    },
    ExecuteResult {
        #[serde(default)]
        data: MimeBundle,
    },
    DisplayData {
        #[serde(default)]
        data: MimeBundle,
    },
    Error {
        #[serde(default)]
        traceback: Vec<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MimeBundle {
    #[serde(rename = "text/plain")]
    pub plain: Option<MultilineText>,
}

impl Output {
    /// Text contributed by this output; empty when it has none.
    pub fn text(&self) -> String {
        match self {
            Output::Stream { text } => text.as_ref().map(MultilineText::to_text).unwrap_or_default(),
            Output::ExecuteResult { data } | Output::DisplayData { data } => {
                data.plain.as_ref().map(MultilineText::to_text).unwrap_or_default()
            }
            Output::Error { traceback } => traceback.join("\n"),
            Output::Other => String::new(),
        }
    }
}

impl Notebook {
    /// Parses nbformat 4 documents directly and upgrades nbformat 3 ones.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let FormatVersion { nbformat } =
            serde_json::from_str(contents).map_err(|source| malformed(path, source))?;

        match nbformat {
            version if version >= 4 => {
                serde_json::from_str(contents).map_err(|source| malformed(path, source))
            }
            3 => serde_json::from_str::<v3::Notebook>(contents)
                .map(Notebook::from)
                .map_err(|source| malformed(path, source)),
            version => Err(GrabError::UnsupportedNotebook {
                path: path.to_path_buf(),
                version,
            }),
        }
    }

    /// Cell sources in document order, each code cell followed by its
    /// outputs when `include_outputs` is set. Empty fragments are dropped.
    pub fn fragments(&self, include_outputs: bool) -> Vec<String> {
        let mut parts = Vec::new();
        for cell in &self.cells {
            match cell {
                Cell::Markdown { source } => parts.push(source.to_text()),
                Cell::Code { source, outputs } => {
                    parts.push(source.to_text());
                    if include_outputs {
                        parts.extend(outputs.iter().map(Output::text));
                    }
                }
                Cell::Other => {}
            }
        }
        parts.retain(|part| !part.is_empty());
        parts
    }

    pub fn to_text(&self, include_outputs: bool) -> String {
        self.fragments(include_outputs).join("\n")
    }
}

#[derive(Deserialize)]
struct FormatVersion {
    nbformat: u32,
}

fn malformed(path: &Path, source: serde_json::Error) -> GrabError {
    GrabError::Notebook {
        path: path.to_path_buf(),
        source,
    }
}

/// The worksheet-based nbformat 3 layout.
mod v3 {
    use serde::Deserialize;

    use super::{Cell, MimeBundle, MultilineText, Output};

    fn default_level() -> usize {
        1
    }

    #[derive(Debug, Deserialize)]
    pub struct Notebook {
        pub nbformat: u32,
        #[serde(default)]
        pub worksheets: Vec<Worksheet>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Worksheet {
        #[serde(default)]
        pub cells: Vec<V3Cell>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "cell_type", rename_all = "lowercase")]
    pub enum V3Cell {
        Markdown {
            #[serde(default)]
            source: MultilineText,
        },
        Heading {
            #[serde(default)]
            source: MultilineText,
            #[serde(default = "default_level")]
            level: usize,
        },
        Code {
            #[serde(default)]
            input: MultilineText,
            #[serde(default)]
            outputs: Vec<V3Output>,
        },
        #[serde(other)]
        Other,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "output_type", rename_all = "snake_case")]
    pub enum V3Output {
        Pyout {
            #[serde(default)]
            text: Option<MultilineText>,
        },
        DisplayData {
            #[serde(default)]
            text: Option<MultilineText>,
        },
        Stream {
            #[serde(default)]
            text: Option<MultilineText>,
        },
        Pyerr {
            #[serde(default)]
            traceback: Vec<String>,
        },
        #[serde(other)]
        Other,
    }

    impl From<V3Cell> for Cell {
        fn from(cell: V3Cell) -> Self {
            match cell {
                V3Cell::Markdown { source } => Cell::Markdown { source },
                V3Cell::Heading { source, level } => {
                    let line = source.to_text().lines().collect::<Vec<_>>().join(" ");
                    Cell::Markdown {
                        source: MultilineText::Whole(format!("{} {line}", "#".repeat(level))),
                    }
                }
                V3Cell::Code { input, outputs } => Cell::Code {
                    source: input,
                    outputs: outputs.into_iter().map(Output::from).collect(),
                },
                V3Cell::Other => Cell::Other,
            }
        }
    }

    impl From<V3Output> for Output {
        fn from(output: V3Output) -> Self {
            match output {
                V3Output::Pyout { text } => Output::ExecuteResult {
                    data: MimeBundle { plain: text },
                },
                V3Output::DisplayData { text } => Output::DisplayData {
                    data: MimeBundle { plain: text },
                },
                V3Output::Stream { text } => Output::Stream { text },
                V3Output::Pyerr { traceback } => Output::Error { traceback },
                V3Output::Other => Output::Other,
            }
        }
    }

    impl From<Notebook> for super::Notebook {
        fn from(notebook: Notebook) -> Self {
            super::Notebook {
                nbformat: notebook.nbformat,
                cells: notebook
                    .worksheets
                    .into_iter()
                    .flat_map(|worksheet| worksheet.cells)
                    .map(Cell::from)
                    .collect(),
            }
        }
    }
}

/// Reads the notebook at `path` and flattens it to text.
pub fn flatten(path: &Path, include_outputs: bool) -> Result<String> {
    let contents = fs::read_to_string(path).map_err(|err| GrabError::io(path, err))?;
    flatten_str(path, &contents, include_outputs)
}

/// Flattens notebook JSON already held in memory. `path` is only used for
/// error reporting.
pub fn flatten_str(path: &Path, contents: &str, include_outputs: bool) -> Result<String> {
    Ok(Notebook::parse(path, contents)?.to_text(include_outputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTEBOOK: &str = r##"{
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {},
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": ["# Title\n", "intro"]},
            {
                "cell_type": "code",
                "metadata": {},
                "execution_count": 1,
                "source": "print('hi')\n1+1",
                "outputs": [
                    {"output_type": "stream", "name": "stdout", "text": ["hi\n"]},
                    {"output_type": "execute_result", "execution_count": 1, "metadata": {},
                     "data": {"text/plain": "2", "text/html": "<b>2</b>"}},
                    {"output_type": "display_data", "metadata": {}, "data": {"image/png": "AAAA"}}
                ]
            },
            {"cell_type": "raw", "metadata": {}, "source": "raw text"},
            {
                "cell_type": "code",
                "metadata": {},
                "execution_count": 2,
                "source": "",
                "outputs": [
                    {"output_type": "error", "ename": "ValueError", "evalue": "bad",
                     "traceback": ["Traceback", "ValueError: bad"]}
                ]
            }
        ]
    }"##;

    fn path() -> &'static Path {
        Path::new("test.ipynb")
    }

    #[test]
    fn flattens_sources_without_outputs() {
        let text = flatten_str(path(), NOTEBOOK, false).unwrap();
        assert_eq!(text, "# Title\nintro\nprint('hi')\n1+1");
    }

    #[test]
    fn appends_outputs_after_owning_cell() {
        let text = flatten_str(path(), NOTEBOOK, true).unwrap();
        assert_eq!(
            text,
            "# Title\nintro\nprint('hi')\n1+1\nhi\n\n2\nTraceback\nValueError: bad"
        );
    }

    #[test]
    fn output_text_rules() {
        let stream: Output = serde_json::from_str(r#"{"output_type": "stream"}"#).unwrap();
        assert_eq!(stream.text(), "");

        let display: Output =
            serde_json::from_str(r#"{"output_type": "display_data", "data": {"text/plain": ["a", "b"]}}"#)
                .unwrap();
        assert_eq!(display.text(), "ab");

        let unknown: Output =
            serde_json::from_str(r#"{"output_type": "update_display_data", "data": {}}"#).unwrap();
        assert_eq!(unknown.text(), "");
    }

    #[test]
    fn malformed_notebook_is_an_error() {
        let err = flatten_str(path(), "{not json", false).unwrap_err();
        assert!(matches!(err, GrabError::Notebook { .. }));
    }

    #[test]
    fn upgrades_worksheet_notebooks() {
        let old = r##"{
            "nbformat": 3,
            "nbformat_minor": 0,
            "metadata": {"name": "old"},
            "worksheets": [{
                "metadata": {},
                "cells": [
                    {"cell_type": "heading", "level": 2, "metadata": {}, "source": "Results"},
                    {"cell_type": "markdown", "metadata": {}, "source": ["md"]},
                    {
                        "cell_type": "code",
                        "language": "python",
                        "collapsed": false,
                        "metadata": {},
                        "input": ["1+1"],
                        "prompt_number": 1,
                        "outputs": [
                            {"output_type": "pyout", "prompt_number": 1, "metadata": {}, "text": ["2"]},
                            {"output_type": "stream", "stream": "stdout", "text": "done"},
                            {"output_type": "pyerr", "ename": "E", "evalue": "x", "traceback": ["tb1", "tb2"]}
                        ]
                    }
                ]
            }]
        }"##;

        assert_eq!(flatten_str(path(), old, false).unwrap(), "## Results\nmd\n1+1");
        assert_eq!(
            flatten_str(path(), old, true).unwrap(),
            "## Results\nmd\n1+1\n2\ndone\ntb1\ntb2"
        );
    }

    #[test]
    fn rejects_formats_older_than_three() {
        let err = flatten_str(path(), r#"{"nbformat": 2, "worksheets": []}"#, false).unwrap_err();
        assert!(matches!(err, GrabError::UnsupportedNotebook { version: 2, .. }));
    }

    #[test]
    fn missing_format_version_is_malformed() {
        let err = flatten_str(path(), r#"{"cells": []}"#, false).unwrap_err();
        assert!(matches!(err, GrabError::Notebook { .. }));
    }
}
