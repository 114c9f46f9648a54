//! In-memory genotype matrix: rows are sites, columns are samples
//!

mod densify;
mod metadata;
mod read;

pub use self::densify::densify;
#[cfg(test)]
pub use self::metadata::{MATRIX_TABLE_FORMAT_VERSION, MatrixTableMetadata};
pub use self::metadata::MATRIX_TABLE_METADATA_FILENAME;
pub use self::read::read_matrix_table;

/// Genomic position of a matrix table row
///
/// Ordering is by contig index (the order of contigs in the matrix table header) and then
/// position, which is the required row ordering of the matrix table.
///
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locus {
    pub contig_index: usize,

    /// 1-indexed position
    pub position: i64,
}

/// Unique key of each matrix table row
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub locus: Locus,

    /// Reference allele followed by all alternate alleles
    pub alleles: Vec<Vec<u8>>,
}

impl RowKey {
    pub fn alt_allele_count(&self) -> usize {
        self.alleles.len().saturating_sub(1)
    }
}

/// A defined genotype call
///
/// Partially missing calls (such as './1') are not represented, these are treated as missing
/// calls.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub alleles: Vec<u32>,
}

impl Call {
    pub fn new(alleles: Vec<u32>) -> Self {
        assert!(!alleles.is_empty());
        Self { alleles }
    }

    pub fn is_haploid(&self) -> bool {
        self.alleles.len() == 1
    }

    pub fn is_non_ref(&self) -> bool {
        self.alleles.iter().any(|&x| x > 0)
    }

    pub fn is_het(&self) -> bool {
        self.alleles.iter().any(|&x| x != self.alleles[0])
    }

    /// Number of copies of `allele` in this call
    pub fn allele_copies(&self, allele: u32) -> usize {
        self.alleles.iter().filter(|&&x| x == allele).count()
    }
}

/// All values of one (row, sample) entry
///
/// Every field is optional, an entry with no defined fields is not stored in the sparse matrix.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub gt: Option<Call>,
    pub dp: Option<i32>,
    pub gq: Option<i32>,
    pub ad: Option<Vec<Option<i32>>>,

    /// 1-indexed inclusive end position of a reference block starting at this row
    pub end: Option<i64>,

    pub qual_approx: Option<i32>,
    pub var_dp: Option<i32>,
    pub read_pos_rank_sum: Option<f32>,
    pub mq_rank_sum: Option<f32>,

    /// Strand bias table: ref forward, ref reverse, alt forward, alt reverse
    pub sb: Option<[i32; 4]>,

    /// Sum of squared mapping qualities and the read depth it was computed over
    pub raw_mq_and_dp: Option<[i32; 2]>,
}

impl Entry {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_non_ref_call(&self) -> bool {
        self.gt.as_ref().is_some_and(|x| x.is_non_ref())
    }
}

pub struct MatrixRow {
    pub key: RowKey,

    /// Entries indexed on sample index. Absent entries are None
    pub entries: Vec<Option<Entry>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContigInfo {
    pub name: String,
    pub length: Option<u64>,
}

/// Records which optional entry fields are declared by the matrix table
///
/// Required fields (GT, DP) are not listed because loading fails without them.
///
#[derive(Clone, Debug, Default)]
pub struct EntryFieldAvailability {
    pub gq: bool,
    pub ad: bool,
    pub end: bool,
    pub qual_approx: bool,
    pub var_dp: bool,
    pub read_pos_rank_sum: bool,
    pub mq_rank_sum: bool,
    pub sb: bool,
    pub raw_mq_and_dp: bool,
}

#[derive(Clone)]
pub struct MatrixTableHeader {
    pub reference_genome: String,
    pub contigs: Vec<ContigInfo>,
    pub samples: Vec<String>,
    pub entry_fields: EntryFieldAvailability,
}

pub struct MatrixTable {
    pub header: MatrixTableHeader,
    pub rows: Vec<MatrixRow>,
}
