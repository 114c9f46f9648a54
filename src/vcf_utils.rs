use rust_htslib::bcf::header::Header;
use rust_htslib::{htslib, utils};

use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::matrix_table::ContigInfo;

// Imported non-public constants from rust-htslib
pub const MISSING_INTEGER: i32 = i32::MIN;
pub const VECTOR_END_INTEGER: i32 = i32::MIN + 1;

/// Get a new bcf header which is actually empty so that we can set our own version number
///
pub fn get_empty_bcf_header() -> Header {
    // Give the incorrect mode to htslib to prevent it from writing the wrong VCF version number.
    // As of 202409 htslib doesn't store the mode argument so this shouldn't break the output.
    //
    let mode = c"r";
    Header {
        inner: unsafe { htslib::bcf_hdr_init(mode.as_ptr()) },
        subset: None,
    }
}

/// Builds common fields into a sites-only VCF header, upon which more app specific details can
/// be added
///
/// Contig records are added in the order given, so that each contig's index in `contigs` is
/// also its record rid.
///
pub fn get_basic_vcf_header(reference_genome: &str, contigs: &[ContigInfo]) -> Header {
    let mut header = get_empty_bcf_header();
    header.push_record(b"##fileformat=VCFv4.2");

    let date_string = chrono::Local::now().format("%Y%m%d").to_string();
    header.push_record(format!("##fileDate={date_string}").as_bytes());
    header.push_record(format!("##source=\"{PROGRAM_NAME} {PROGRAM_VERSION}\"").as_bytes());
    let cmdline = std::env::args().collect::<Vec<_>>().join(" ");
    header.push_record(format!("##{PROGRAM_NAME}_cmdline=\"{cmdline}\"").as_bytes());
    header.push_record(format!("##reference={reference_genome}").as_bytes());

    for contig in contigs.iter() {
        let header_contig_line = match contig.length {
            Some(length) => format!("##contig=<ID={},length={length}>", contig.name),
            None => format!("##contig=<ID={}>", contig.name),
        };
        header.push_record(header_contig_line.as_bytes());
    }

    header
}

#[derive(Debug)]
pub struct BcfBuildError {
    pub msg: String,
}

impl BcfBuildError {
    pub fn error_message(error: i32) -> &'static str {
        match error {
            -1 => "indexing failed",
            -2 => "opening @fn failed",
            -3 => "format not indexable",
            -4 => "failed to create and/or save the index",
            _ => "unknown error",
        }
    }
}

impl std::error::Error for BcfBuildError {}

impl std::fmt::Display for BcfBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BcfBuildError{{msg: {}}}", self.msg)
    }
}

/// Build index for bcf or vcf.gz file
///
/// # Arguments
/// * `bcf_path` - Path to bcf/vcf file for indexing
/// * `build_tbi` - If true build older tbi style index, otherwise build csi index
///
pub fn build_bcf_index<P: AsRef<std::path::Path>>(
    bcf_path: P,
    n_threads: usize,
    build_tbi: bool,
) -> Result<(), BcfBuildError> {
    let min_shift = if build_tbi { 0 } else { 14 };
    let idx_path_ptr = std::ptr::null();
    let bcf_path = utils::path_to_cstring(&bcf_path).ok_or_else(|| BcfBuildError {
        msg: format!(
            "Invalid bcf index input path: '{}'",
            bcf_path.as_ref().display()
        ),
    })?;
    let ret = unsafe {
        /*
         *  bcf_index_build3() - Generate and save an index to a specific file
         *  @fn:         Input VCF/BCF filename
         *  @fnidx:      Output filename, or NULL to add .csi/.tbi to @fn
         *  @min_shift:  Positive to generate CSI, or 0 to generate TBI
         *  @n_threads:  Number of VCF/BCF decoder threads
         *
         *  Returns 0 if successful, or negative if an error occurred.
         */
        htslib::bcf_index_build3(bcf_path.as_ptr(), idx_path_ptr, min_shift, n_threads as i32)
    };
    match ret {
        0 => Ok(()),
        e => Err(BcfBuildError {
            msg: format!(
                "Failed to build bcf index. Error: {e:?}/{}",
                BcfBuildError::error_message(e)
            ),
        }),
    }
}
