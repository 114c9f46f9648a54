use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use camino::Utf8Path;
use log::info;
use rust_htslib::bcf::header::{HeaderRecord, HeaderView};
use rust_htslib::bcf::{self, Read};
use simple_error::{SimpleResult, bail, map_err_with};
use thousands::Separable;

use super::metadata::read_matrix_table_metadata;
use super::{
    Call, ContigInfo, Entry, EntryFieldAvailability, Locus, MatrixRow, MatrixTable,
    MatrixTableHeader, RowKey,
};
use crate::vcf_utils::{MISSING_INTEGER, VECTOR_END_INTEGER};

const REQUIRED_ENTRY_FIELDS: [&str; 2] = ["GT", "DP"];

fn get_contig_list(header: &HeaderView) -> SimpleResult<Vec<ContigInfo>> {
    let mut contig_lengths = HashMap::new();
    for record in header.header_records() {
        if let HeaderRecord::Contig { values, .. } = record {
            if let (Some(id), Some(length)) = (values.get("ID"), values.get("length")) {
                if let Ok(length) = length.parse::<u64>() {
                    contig_lengths.insert(id.clone(), length);
                }
            }
        }
    }

    let mut contigs = Vec::new();
    for rid in 0..header.contig_count() {
        let name_bytes = map_err_with!(header.rid2name(rid), "Can't find contig index {rid}")?;
        let name = map_err_with!(
            std::str::from_utf8(name_bytes),
            "Contig name is not valid utf8"
        )?
        .to_string();
        let length = contig_lengths.get(&name).copied();
        contigs.push(ContigInfo { name, length });
    }
    Ok(contigs)
}

fn get_sample_list(header: &HeaderView) -> SimpleResult<Vec<String>> {
    let mut samples = Vec::new();
    let mut observed = HashSet::new();
    for sample_bytes in header.samples() {
        let sample = map_err_with!(
            std::str::from_utf8(sample_bytes),
            "Sample name is not valid utf8"
        )?
        .to_string();
        if !observed.insert(sample.clone()) {
            bail!("Duplicated sample ID in matrix table: '{sample}'");
        }
        samples.push(sample);
    }
    Ok(samples)
}

fn get_matrix_table_header(
    header: &HeaderView,
    reference_genome: &str,
    entries_filename: &Utf8Path,
) -> SimpleResult<MatrixTableHeader> {
    for tag in REQUIRED_ENTRY_FIELDS {
        if header.format_type(tag.as_bytes()).is_err() {
            bail!(
                "Matrix table entries file '{entries_filename}' does not define required entry field '{tag}'"
            );
        }
    }

    let has_field = |tag: &[u8]| header.format_type(tag).is_ok();
    let entry_fields = EntryFieldAvailability {
        gq: has_field(b"GQ"),
        ad: has_field(b"AD"),
        end: has_field(b"END"),
        qual_approx: has_field(b"QUALapprox"),
        var_dp: has_field(b"VarDP"),
        read_pos_rank_sum: has_field(b"ReadPosRankSum"),
        mq_rank_sum: has_field(b"MQRankSum"),
        sb: has_field(b"SB"),
        raw_mq_and_dp: has_field(b"RAW_MQandDP"),
    };

    Ok(MatrixTableHeader {
        reference_genome: reference_genome.to_string(),
        contigs: get_contig_list(header)?,
        samples: get_sample_list(header)?,
        entry_fields,
    })
}

/// Per-sample integer values for one FORMAT tag, with missing values converted to None
///
/// A tag which is not present in the record is treated as missing in all samples.
///
fn get_integer_format_values(
    rec: &bcf::Record,
    tag: &[u8],
    sample_count: usize,
) -> Vec<Vec<Option<i32>>> {
    match rec.format(tag).integer() {
        Ok(values) => values
            .iter()
            .map(|sample_values| {
                sample_values
                    .iter()
                    .take_while(|&&x| x != VECTOR_END_INTEGER)
                    .map(|&x| if x == MISSING_INTEGER { None } else { Some(x) })
                    .collect()
            })
            .collect(),
        Err(_) => vec![Vec::new(); sample_count],
    }
}

fn get_float_format_values(
    rec: &bcf::Record,
    tag: &[u8],
    sample_count: usize,
) -> Vec<Option<f32>> {
    match rec.format(tag).float() {
        Ok(values) => values
            .iter()
            .map(|sample_values| sample_values.first().copied().filter(|x| !x.is_nan()))
            .collect(),
        Err(_) => vec![None; sample_count],
    }
}

fn get_fixed_array<const N: usize>(values: &[Option<i32>]) -> Option<[i32; N]> {
    let values = values.iter().copied().collect::<Option<Vec<_>>>()?;
    values.try_into().ok()
}

fn get_first<T: Copy>(values: &[Option<T>]) -> Option<T> {
    values.first().copied().flatten()
}

/// Get the genotype call for every sample, leaving partially or fully missing calls undefined
///
fn get_calls(rec: &bcf::Record, sample_count: usize) -> Vec<Option<Call>> {
    let genotypes = match rec.genotypes() {
        Ok(x) => x,
        Err(_) => return vec![None; sample_count],
    };
    (0..sample_count)
        .map(|sample_index| {
            let gt = genotypes.get(sample_index);
            let alleles = gt.iter().map(|x| x.index()).collect::<Option<Vec<_>>>()?;
            if alleles.is_empty() {
                None
            } else {
                Some(Call::new(alleles))
            }
        })
        .collect()
}

fn convert_bcf_record_to_matrix_row(
    fields: &EntryFieldAvailability,
    sample_count: usize,
    rec: &bcf::Record,
) -> SimpleResult<MatrixRow> {
    let contig_index = match rec.rid() {
        Some(x) => x as usize,
        None => bail!("Matrix table row is missing a contig"),
    };
    let locus = Locus {
        contig_index,
        position: rec.pos() + 1,
    };
    let alleles = rec.alleles().into_iter().map(|x| x.to_vec()).collect();
    let key = RowKey { locus, alleles };

    let integer_values = |enabled: bool, tag: &[u8]| {
        if enabled {
            get_integer_format_values(rec, tag, sample_count)
        } else {
            vec![Vec::new(); sample_count]
        }
    };
    let float_values = |enabled: bool, tag: &[u8]| {
        if enabled {
            get_float_format_values(rec, tag, sample_count)
        } else {
            vec![None; sample_count]
        }
    };

    let calls = get_calls(rec, sample_count);
    let dps = integer_values(true, b"DP");
    let gqs = integer_values(fields.gq, b"GQ");
    let ads = integer_values(fields.ad, b"AD");
    let ends = integer_values(fields.end, b"END");
    let qual_approxs = integer_values(fields.qual_approx, b"QUALapprox");
    let var_dps = integer_values(fields.var_dp, b"VarDP");
    let read_pos_rank_sums = float_values(fields.read_pos_rank_sum, b"ReadPosRankSum");
    let mq_rank_sums = float_values(fields.mq_rank_sum, b"MQRankSum");
    let sbs = integer_values(fields.sb, b"SB");
    let raw_mq_and_dps = integer_values(fields.raw_mq_and_dp, b"RAW_MQandDP");

    let mut entries = Vec::with_capacity(sample_count);
    for (sample_index, gt) in calls.into_iter().enumerate() {
        let ad = &ads[sample_index];
        let entry = Entry {
            gt,
            dp: get_first(&dps[sample_index]),
            gq: get_first(&gqs[sample_index]),
            ad: if ad.iter().all(|x| x.is_none()) {
                None
            } else {
                Some(ad.clone())
            },
            end: get_first(&ends[sample_index]).map(i64::from),
            qual_approx: get_first(&qual_approxs[sample_index]),
            var_dp: get_first(&var_dps[sample_index]),
            read_pos_rank_sum: read_pos_rank_sums[sample_index],
            mq_rank_sum: mq_rank_sums[sample_index],
            sb: get_fixed_array(&sbs[sample_index]),
            raw_mq_and_dp: get_fixed_array(&raw_mq_and_dps[sample_index]),
        };
        entries.push(if entry.is_empty() { None } else { Some(entry) });
    }

    Ok(MatrixRow { key, entries })
}

fn get_locus_label(contigs: &[ContigInfo], locus: &Locus) -> String {
    format!("{}:{}", contigs[locus.contig_index].name, locus.position)
}

/// Enforces sorted row order and row key uniqueness while streaming through the matrix rows
///
#[derive(Default)]
struct RowKeyChecker {
    last_locus: Option<Locus>,

    /// All allele lists observed at last_locus
    locus_alleles: HashSet<Vec<Vec<u8>>>,
}

impl RowKeyChecker {
    fn check(&mut self, contigs: &[ContigInfo], key: &RowKey) -> SimpleResult<()> {
        if let Some(last_locus) = &self.last_locus {
            match key.locus.cmp(last_locus) {
                Ordering::Less => {
                    bail!(
                        "Matrix table rows are not sorted, row at {} follows row at {}",
                        get_locus_label(contigs, &key.locus),
                        get_locus_label(contigs, last_locus)
                    );
                }
                Ordering::Equal => {
                    if !self.locus_alleles.insert(key.alleles.clone()) {
                        bail!(
                            "Duplicated matrix table row key at {}",
                            get_locus_label(contigs, &key.locus)
                        );
                    }
                    return Ok(());
                }
                Ordering::Greater => {}
            }
        }
        self.last_locus = Some(key.locus.clone());
        self.locus_alleles.clear();
        self.locus_alleles.insert(key.alleles.clone());
        Ok(())
    }
}

/// Read the matrix table stored in directory `mt_dir`
///
/// Any missing required entry field, unsorted or duplicated row key, or htslib parsing error is
/// returned as an error.
///
pub fn read_matrix_table(mt_dir: &Utf8Path) -> SimpleResult<MatrixTable> {
    let metadata = read_matrix_table_metadata(mt_dir)?;

    let entries_filename = mt_dir.join(&metadata.entries);
    if !entries_filename.is_file() {
        bail!("Matrix table entries file does not exist or is not a file: '{entries_filename}'");
    }

    let mut reader = map_err_with!(
        bcf::Reader::from_path(&entries_filename),
        "Unable to open matrix table entries file: '{entries_filename}'"
    )?;
    let header = get_matrix_table_header(
        reader.header(),
        &metadata.reference_genome,
        &entries_filename,
    )?;

    let sample_count = header.samples.len();
    let mut rows = Vec::new();
    let mut row_key_checker = RowKeyChecker::default();

    let mut rec = reader.empty_record();
    while let Some(r) = reader.read(&mut rec) {
        map_err_with!(
            r,
            "Failed to parse matrix table row from '{entries_filename}'"
        )?;
        let row = convert_bcf_record_to_matrix_row(&header.entry_fields, sample_count, &rec)?;
        row_key_checker.check(&header.contigs, &row.key)?;
        rows.push(row);
    }

    info!(
        "Read {} rows over {} samples from matrix table",
        rows.len().separate_with_commas(),
        sample_count.separate_with_commas()
    );

    Ok(MatrixTable { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{get_test_dir, get_test_vcf, write_test_matrix_table};

    #[test]
    fn test_read_matrix_table() {
        let (_dir, dir_path) = get_test_dir();
        let vcf = get_test_vcf(
            &["S1", "S2"],
            &[
                "chr1\t10\t.\tA\tG\t.\t.\t.\tGT:DP:GQ:AD\t0/1:10:30:5,5\t1/1:20:40:0,20",
                "chr1\t12\t.\tC\t.\t.\t.\t.\tGT:DP:END\t0/0:8:20\t.",
                "chr2\t5\t.\tGCT\tG\t.\t.\t.\tGT:DP\t./.:4\t.",
            ],
        );
        let mt_dir = write_test_matrix_table(&dir_path, "test", &vcf);

        let mt = read_matrix_table(&mt_dir).unwrap();
        assert_eq!(mt.header.samples, vec!["S1", "S2"]);
        assert_eq!(mt.header.reference_genome, "GRCh38");
        assert_eq!(mt.header.contigs.len(), 2);
        assert_eq!(mt.header.contigs[0].name, "chr1");
        assert_eq!(mt.header.contigs[0].length, Some(10000));
        assert!(mt.header.entry_fields.end);
        assert!(mt.header.entry_fields.sb);
        assert_eq!(mt.rows.len(), 3);

        let row = &mt.rows[0];
        assert_eq!(row.key.locus.position, 10);
        assert_eq!(row.key.alleles, vec![b"A".to_vec(), b"G".to_vec()]);
        let s1 = row.entries[0].as_ref().unwrap();
        assert_eq!(s1.gt, Some(Call::new(vec![0, 1])));
        assert_eq!(s1.dp, Some(10));
        assert_eq!(s1.gq, Some(30));
        assert_eq!(s1.ad, Some(vec![Some(5), Some(5)]));
        assert_eq!(s1.end, None);

        // Reference block row with an absent second entry
        let row = &mt.rows[1];
        assert_eq!(row.key.alleles.len(), 1);
        assert_eq!(row.entries[0].as_ref().unwrap().end, Some(20));
        assert!(row.entries[1].is_none());

        // Entry with an undefined call is still present
        let row = &mt.rows[2];
        assert_eq!(row.key.locus.contig_index, 1);
        let s1 = row.entries[0].as_ref().unwrap();
        assert_eq!(s1.gt, None);
        assert_eq!(s1.dp, Some(4));
        assert!(row.entries[1].is_none());
    }

    #[test]
    fn test_read_matrix_table_unsorted() {
        let (_dir, dir_path) = get_test_dir();
        let vcf = get_test_vcf(
            &["S1"],
            &[
                "chr1\t20\t.\tA\tG\t.\t.\t.\tGT:DP\t0/1:10",
                "chr1\t10\t.\tA\tG\t.\t.\t.\tGT:DP\t0/1:10",
            ],
        );
        let mt_dir = write_test_matrix_table(&dir_path, "test", &vcf);
        assert!(read_matrix_table(&mt_dir).is_err());
    }

    #[test]
    fn test_read_matrix_table_duplicate_key() {
        let (_dir, dir_path) = get_test_dir();
        let vcf = get_test_vcf(
            &["S1"],
            &[
                "chr1\t10\t.\tA\tG\t.\t.\t.\tGT:DP\t0/1:10",
                "chr1\t10\t.\tA\tT\t.\t.\t.\tGT:DP\t0/1:10",
                "chr1\t10\t.\tA\tG\t.\t.\t.\tGT:DP\t0/1:10",
            ],
        );
        let mt_dir = write_test_matrix_table(&dir_path, "test", &vcf);
        assert!(read_matrix_table(&mt_dir).is_err());
    }

    #[test]
    fn test_read_matrix_table_missing_required_field() {
        let (_dir, dir_path) = get_test_dir();
        let vcf = "##fileformat=VCFv4.2\n\
            ##contig=<ID=chr1,length=100>\n\
            ##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            chr1\t10\t.\tA\tG\t.\t.\t.\tGT\t0/1\n";
        let mt_dir = write_test_matrix_table(&dir_path, "test", vcf);
        assert!(read_matrix_table(&mt_dir).is_err());
    }

    #[test]
    fn test_row_key_checker() {
        let contigs = vec![ContigInfo {
            name: "chr1".to_string(),
            length: None,
        }];
        let key = |position: i64, alt: &[u8]| RowKey {
            locus: Locus {
                contig_index: 0,
                position,
            },
            alleles: vec![b"A".to_vec(), alt.to_vec()],
        };

        let mut checker = RowKeyChecker::default();
        assert!(checker.check(&contigs, &key(5, b"G")).is_ok());
        assert!(checker.check(&contigs, &key(5, b"T")).is_ok());
        assert!(checker.check(&contigs, &key(6, b"G")).is_ok());
        assert!(checker.check(&contigs, &key(6, b"G")).is_err());

        let mut checker = RowKeyChecker::default();
        assert!(checker.check(&contigs, &key(5, b"G")).is_ok());
        assert!(checker.check(&contigs, &key(4, b"G")).is_err());
    }
}
