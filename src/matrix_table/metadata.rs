use std::fs::File;
use std::io::BufReader;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail, map_err_with};

pub const MATRIX_TABLE_METADATA_FILENAME: &str = "metadata.json";

pub const MATRIX_TABLE_FORMAT_VERSION: u32 = 1;

/// Matrix table directory description, stored in json format
#[derive(Deserialize, Serialize)]
pub struct MatrixTableMetadata {
    pub format_version: u32,

    /// Reference genome name, this is transferred to the output VCF header
    pub reference_genome: String,

    /// Name of the multi-sample VCF/BCF entries file within the matrix table directory
    pub entries: String,
}

pub fn read_matrix_table_metadata(mt_dir: &Utf8Path) -> SimpleResult<MatrixTableMetadata> {
    let filename = mt_dir.join(MATRIX_TABLE_METADATA_FILENAME);
    let file = map_err_with!(
        File::open(&filename),
        "Unable to open matrix table metadata file: '{filename}'"
    )?;
    let reader = BufReader::new(file);
    let metadata: MatrixTableMetadata = map_err_with!(
        serde_json::from_reader(reader),
        "Unable to parse matrix table metadata from json file: '{filename}'"
    )?;

    if metadata.format_version != MATRIX_TABLE_FORMAT_VERSION {
        bail!(
            "Unsupported matrix table format version {} in '{filename}', expected version {MATRIX_TABLE_FORMAT_VERSION}",
            metadata.format_version
        );
    }
    if metadata.entries.is_empty() {
        bail!("Matrix table metadata file '{filename}' does not name an entries file");
    }

    Ok(metadata)
}
